//! List the posts available from the content source

use anyhow::{Context, Result};

use crate::content::PostPagination;
use crate::helpers::parse_timestamp;
use crate::source::ContentSource;
use crate::Blog;

/// Page size used when walking every post
const LIST_PAGE_SIZE: u32 = 100;

/// Print every post with its publication date and slug
pub async fn run(blog: &Blog, source: &dyn ContentSource) -> Result<()> {
    let lines = collect(blog, source).await?;

    println!("Posts ({}):", lines.len());
    for line in lines {
        println!("  {}", line);
    }

    Ok(())
}

async fn collect(blog: &Blog, source: &dyn ContentSource) -> Result<Vec<String>> {
    let doc_type = &blog.config.prismic.document_type;
    let mut response = source
        .query_by_type(doc_type, LIST_PAGE_SIZE)
        .await
        .context("Failed to query posts")?;
    let mut lines = Vec::new();

    loop {
        let cursor = response.next_page.take().filter(|c| !c.is_empty());
        let page = PostPagination::try_from(response)?;

        for post in page.results {
            let date = post
                .first_publication_date
                .as_deref()
                .and_then(parse_timestamp)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "----------".to_string());
            lines.push(format!("{} - {} [{}]", date, post.data.title, post.uid));
        }

        match cursor {
            Some(cursor) => response = source.fetch_page(&cursor).await?,
            None => break,
        }
    }

    Ok(lines)
}
