//! Generator module - renders the listing and post pages to static HTML

use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tera::Context;
use walkdir::WalkDir;

use crate::content::{PostDetail, PostSummary, RichTextRenderer};
use crate::detail;
use crate::helpers::{encode_component, full_url_for, post_path, url_for, DateFormatter};
use crate::i18n::I18n;
use crate::listing::Listing;
use crate::source::ContentSource;
use crate::templates::{PostItemData, PostPageData, SectionData, SiteData, TemplateRenderer};
use crate::Blog;

/// Page size used when collecting every slug at build time
const STATIC_PATHS_PAGE_SIZE: u32 = 100;

/// Seconds before the loading placeholder reloads itself
const LOADING_REFRESH_SECS: u32 = 1;

/// Outcome of a full generation
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    /// Posts on the first listing page
    pub listed: usize,
    /// Slugs with a generated page
    pub prerendered: Vec<String>,
    /// Slugs listed by the API that could not be resolved
    pub skipped: Vec<String>,
}

/// Static site generator using Tera templates
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    i18n: I18n,
    dates: DateFormatter,
    rich_text: RichTextRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let config = &blog.config;
        let renderer = TemplateRenderer::new()?;

        let mut i18n = I18n::new(&config.language);
        i18n.load_languages(blog.base_dir.join("languages"))?;

        let dates = DateFormatter::new(&config.date_format, &config.timezone, i18n.clone())?;
        let rich_text = RichTextRenderer::new(config.rich_text.embed, &config.root);

        Ok(Self {
            blog: blog.clone(),
            renderer,
            i18n,
            dates,
            rich_text,
        })
    }

    /// Generate the entire site
    ///
    /// Any failure to reach the content API, or a malformed response, fails
    /// the whole generation.
    pub async fn generate(&self, source: &dyn ContentSource) -> Result<GenerateReport> {
        let prismic = &self.blog.config.prismic;
        let mut report = GenerateReport::default();

        // Ensure public directory exists
        fs::create_dir_all(&self.blog.public_dir)?;

        // Copy static assets (logo, images, etc.)
        self.copy_source_assets()?;

        // Home page
        let listing = Listing::first_page(source, &prismic.document_type, prismic.page_size)
            .await
            .context("Failed to fetch the first page of posts")?;
        report.listed = listing.posts().len();
        if listing.has_more() {
            tracing::info!(
                "More posts than fit on the home page; \"load more\" needs `spacetraveling server`"
            );
        }

        let output_path = self.blog.public_dir.join("index.html");
        fs::write(&output_path, self.render_listing(&listing)?)?;
        tracing::debug!("Generated: {:?}", output_path);

        // Post pages
        let slugs = detail::static_paths(source, &prismic.document_type, STATIC_PATHS_PAGE_SIZE)
            .await
            .context("Failed to collect post slugs")?;

        for slug in slugs {
            if !detail::is_valid_slug(&slug) {
                tracing::warn!("Skipping post with unusable slug {:?}", slug);
                report.skipped.push(slug);
                continue;
            }

            let post = detail::resolve_post(source, &prismic.document_type, &slug)
                .await
                .with_context(|| format!("Failed to fetch post {:?}", slug))?;

            match post {
                Some(post) => {
                    self.write_post(&post)?;
                    report.prerendered.push(slug);
                }
                None => {
                    tracing::warn!("Post {:?} disappeared during generation, skipping", slug);
                    report.skipped.push(slug);
                }
            }
        }

        tracing::info!(
            "Generated home page ({} posts) and {} post pages",
            report.listed,
            report.prerendered.len()
        );

        Ok(report)
    }

    /// Render the home page
    pub fn render_listing(&self, listing: &Listing) -> Result<String> {
        let context = self.listing_context(listing);
        self.renderer.render("index.html", &context)
    }

    /// Render the items of a listing and its next control, without the page
    /// around them
    pub fn render_more(&self, listing: &Listing) -> Result<String> {
        let context = self.listing_context(listing);
        self.renderer.render("more.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, post: &PostDetail) -> Result<String> {
        let sections = post
            .data
            .content
            .iter()
            .map(|section| SectionData {
                heading: section.heading.clone(),
                anchor: slug::slugify(&section.heading),
                html: self.rich_text.as_html(&section.body),
            })
            .collect();

        let minutes = post.reading_time(&self.blog.config.reading_time);
        let data = PostPageData {
            uid: post.uid.clone(),
            url: full_url_for(
                &self.blog.config,
                &format!("post/{}/", encode_component(&post.uid)),
            ),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            banner_url: post
                .data
                .banner
                .as_ref()
                .map(|b| b.url.clone())
                .unwrap_or_default(),
            author: post.data.author.clone(),
            date: self.dates.format(post.first_publication_date.as_deref()),
            reading_time: self.i18n.get_count("reading_time", minutes),
            sections,
        };

        let mut context = self.base_context();
        context.insert("post", &data);
        self.renderer.render("post.html", &context)
    }

    /// Render the placeholder shown while a post is being resolved
    pub fn render_loading(&self) -> Result<String> {
        let mut context = self.base_context();
        context.insert("refresh_secs", &LOADING_REFRESH_SECS);
        self.renderer.render("loading.html", &context)
    }

    /// Render a post and write it to `public/post/<uid>/index.html`
    ///
    /// The page is written to a temporary file next to it and renamed into
    /// place, so readers never see a partial page.
    pub fn write_post(&self, post: &PostDetail) -> Result<PathBuf> {
        let html = self.render_post(post)?;

        let output_path = self.post_output_path(&post.uid);
        let parent = output_path
            .parent()
            .context("Post output path has no parent")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;

        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create a temporary file in {:?}", parent))?;
        file.write_all(html.as_bytes())?;
        file.persist(&output_path)
            .map_err(|e| e.error)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(output_path)
    }

    /// Where the page of a slug lives
    pub fn post_output_path(&self, slug: &str) -> PathBuf {
        self.blog
            .public_dir
            .join("post")
            .join(slug)
            .join("index.html")
    }

    fn listing_context(&self, listing: &Listing) -> Context {
        let posts: Vec<PostItemData> = listing.posts().iter().map(|p| self.post_item(p)).collect();

        let mut context = self.base_context();
        context.insert("posts", &posts);
        context.insert("next_page", &listing.next_page());
        context.insert("more_url", &url_for(&self.blog.config, "posts/more"));
        context
    }

    fn post_item(&self, post: &PostSummary) -> PostItemData {
        PostItemData {
            uid: post.uid.clone(),
            path: post_path(&self.blog.config, &post.uid),
            title: post.data.title.clone(),
            subtitle: post.data.subtitle.clone(),
            author: post.data.author.clone(),
            date: self.dates.format(post.first_publication_date.as_deref()),
        }
    }

    /// Create a base context with common variables
    fn base_context(&self) -> Context {
        let config = &self.blog.config;
        let site = SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, "/"),
            logo: url_for(config, &config.logo),
            version: env!("CARGO_PKG_VERSION").to_string(),
            load_more_label: self.i18n.get("load_more"),
            loading_label: self.i18n.get("loading"),
        };

        let mut context = Context::new();
        context.insert("site", &site);
        context
    }

    /// Copy static assets to the public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(source_dir)?;

            // Skip hidden files and directories
            let hidden = relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .map(|s| s.starts_with('.'))
                    .unwrap_or(false)
            });
            if hidden {
                continue;
            }

            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }

        tracing::debug!("Copied {} static assets", copied);
        Ok(())
    }
}
