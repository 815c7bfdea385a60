//! Detail flow - resolving a single post by slug
//!
//! Every slug known at build time is pre-rendered. Requests for any other
//! slug take the fallback path when it is enabled: a loading placeholder is
//! served while the post is resolved in the background.

use crate::content::PostDetail;
use crate::source::{ContentSource, SourceError};

/// How a request for `/post/{slug}` is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A page was generated for the slug
    Prerendered,
    /// Resolve at request time, showing the placeholder meanwhile
    Fallback,
    NotFound,
}

/// Decide how to serve a slug
pub fn route(slug: &str, prerendered: bool, fallback: bool) -> Route {
    if !is_valid_slug(slug) {
        Route::NotFound
    } else if prerendered {
        Route::Prerendered
    } else if fallback {
        Route::Fallback
    } else {
        Route::NotFound
    }
}

/// Slugs are limited to what the content API generates for uids
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

/// Uids of every document of `doc_type`, walking all pages
pub async fn static_paths(
    source: &dyn ContentSource,
    doc_type: &str,
    page_size: u32,
) -> Result<Vec<String>, SourceError> {
    let mut response = source.query_by_type(doc_type, page_size).await?;
    let mut uids = Vec::new();

    loop {
        uids.extend(response.results.iter().filter_map(|d| d.uid.clone()));

        match response.next_page.take().filter(|c| !c.is_empty()) {
            Some(cursor) => response = source.fetch_page(&cursor).await?,
            None => break,
        }
    }

    tracing::debug!(count = uids.len(), "Collected static paths");
    Ok(uids)
}

/// Look a post up by slug; `None` when no document matches
pub async fn resolve_post(
    source: &dyn ContentSource,
    doc_type: &str,
    slug: &str,
) -> Result<Option<PostDetail>, SourceError> {
    match source.get_by_uid(doc_type, slug).await? {
        Some(doc) => Ok(Some(PostDetail::try_from(doc)?)),
        None => Ok(None),
    }
}
