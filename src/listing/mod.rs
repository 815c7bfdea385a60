//! Listing flow - the home page's post list and its "load more" pagination
//!
//! A [`Listing`] holds the posts shown so far and the cursor of the next
//! page. Loading more always replaces the state with a new list (old posts
//! followed by the fetched ones) and the fetched cursor; nothing is reordered
//! or deduplicated.

use crate::content::{PostPagination, PostSummary};
use crate::source::{ContentSource, SourceError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
}

/// What a call to [`Listing::load_more`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// This many posts were appended
    Appended(usize),
    /// There was no cursor; nothing was fetched
    Exhausted,
}

impl Listing {
    pub fn new(page: PostPagination) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page,
        }
    }

    /// An empty listing positioned at `cursor`
    pub fn resume(cursor: &str) -> Self {
        Self {
            posts: Vec::new(),
            next_page: Some(cursor.to_string()).filter(|c| !c.is_empty()),
        }
    }

    /// Fetch the first page of `doc_type`
    pub async fn first_page(
        source: &dyn ContentSource,
        doc_type: &str,
        page_size: u32,
    ) -> Result<Self, SourceError> {
        let response = source.query_by_type(doc_type, page_size).await?;
        Ok(Self::new(PostPagination::try_from(response)?))
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether the "load more" control is shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the page behind the cursor and append it
    ///
    /// Without a cursor this is a no-op. On failure the state is left as it
    /// was, so the caller can offer the control again.
    pub async fn load_more(
        &mut self,
        source: &dyn ContentSource,
    ) -> Result<LoadOutcome, SourceError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(LoadOutcome::Exhausted);
        };

        let response = source.fetch_page(cursor).await?;
        let page = PostPagination::try_from(response)?;
        let appended = page.results.len();

        let posts = self.posts.iter().cloned().chain(page.results).collect();
        *self = Self {
            posts,
            next_page: page.next_page,
        };

        tracing::debug!(
            appended,
            total = self.posts.len(),
            has_more = self.has_more(),
            "Loaded next page"
        );
        Ok(LoadOutcome::Appended(appended))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Document, MemorySource};
    use serde_json::json;

    fn post(uid: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            last_publication_date: None,
            data: json!({"title": uid, "subtitle": "sub", "author": "Ana"}),
        }
    }

    fn uids(listing: &Listing) -> Vec<&str> {
        listing.posts().iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_more_appends_and_replaces_cursor() {
        let source = MemorySource::new(vec![post("a"), post("b")]);

        let mut listing = Listing::first_page(&source, "post", 1).await.unwrap();
        assert_eq!(uids(&listing), vec!["a"]);
        assert!(listing.has_more());

        let outcome = listing.load_more(&source).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Appended(1));
        assert_eq!(uids(&listing), vec!["a", "b"]);
        assert!(!listing.has_more());
        assert_eq!(listing.next_page(), None);
    }

    #[tokio::test]
    async fn test_prior_entries_are_unchanged() {
        let source = MemorySource::new(vec![post("a"), post("b"), post("c"), post("d"), post("e")]);

        let mut listing = Listing::first_page(&source, "post", 2).await.unwrap();
        let before = listing.posts().to_vec();

        listing.load_more(&source).await.unwrap();
        assert_eq!(&listing.posts()[..2], before.as_slice());
        assert_eq!(uids(&listing), vec!["a", "b", "c", "d"]);
        assert_eq!(listing.next_page(), Some("memory://post?page=3&pageSize=2"));

        listing.load_more(&source).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_issues_no_fetch() {
        let source = MemorySource::new(vec![post("a")]);
        let mut listing = Listing::first_page(&source, "post", 5).await.unwrap();
        assert_eq!(source.requests(), 1);
        assert!(!listing.has_more());

        let snapshot = listing.clone();
        let outcome = listing.load_more(&source).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
        assert_eq!(source.requests(), 1);
        assert_eq!(listing, snapshot);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_state() {
        let source = MemorySource::new(vec![post("a"), post("b")]);
        let mut listing = Listing::first_page(&source, "post", 1).await.unwrap();
        let snapshot = listing.clone();

        source.set_offline(true);
        assert!(listing.load_more(&source).await.is_err());
        assert_eq!(listing, snapshot);
        assert!(listing.has_more());

        source.set_offline(false);
        listing.load_more(&source).await.unwrap();
        assert_eq!(uids(&listing), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_resume_from_cursor() {
        let source = MemorySource::new(vec![post("a"), post("b"), post("c")]);
        let mut listing = Listing::resume("memory://post?page=2&pageSize=1");
        assert!(listing.posts().is_empty());

        listing.load_more(&source).await.unwrap();
        assert_eq!(uids(&listing), vec!["b"]);
        assert!(listing.has_more());

        assert!(!Listing::resume("").has_more());
    }
}
