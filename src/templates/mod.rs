//! Built-in blog templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is on for every
//! template; rendered rich text is the only value marked `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("blog/layout.html")),
            ("index.html", include_str!("blog/index.html")),
            ("more.html", include_str!("blog/more.html")),
            ("post.html", include_str!("blog/post.html")),
            ("loading.html", include_str!("blog/loading.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("blog/partials/header.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("blog/partials/post_item.html"),
            ),
            (
                "partials/load_more.html",
                include_str!("blog/partials/load_more.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub logo: String,
    pub version: String,
    pub load_more_label: String,
    pub loading_label: String,
}

/// A listing entry
#[derive(Debug, Clone, Serialize)]
pub struct PostItemData {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

/// A post page
#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub uid: String,
    /// Absolute URL of the page
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub banner_url: String,
    pub author: String,
    pub date: String,
    pub reading_time: String,
    pub sections: Vec<SectionData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    pub anchor: String,
    /// Rendered rich text, embedded without escaping
    pub html: String,
}
