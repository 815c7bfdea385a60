//! In-memory content source
//!
//! Serves a fixed list of documents with the same paging behaviour as the
//! HTTP API. Cursors look like `memory://post?page=2&pageSize=1`.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{ContentSource, Document, Result, SearchResponse, SourceError};

const CURSOR_SCHEME: &str = "memory://";

#[derive(Debug, Default)]
pub struct MemorySource {
    documents: Vec<Document>,
    requests: AtomicUsize,
    offline: AtomicBool,
}

impl MemorySource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Load documents from a JSON dump: either an array of documents or a
    /// search response with a `results` array
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Dump {
            Documents(Vec<Document>),
            Response(SearchResponse),
        }

        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let documents = match serde_json::from_str::<Dump>(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?
        {
            Dump::Documents(documents) => documents,
            Dump::Response(response) => response.results,
        };

        tracing::info!("Loaded {} documents from {:?}", documents.len(), path);
        Ok(Self::new(documents))
    }

    /// Number of requests served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// While offline every request fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn begin_request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(SourceError::Network("content source is offline".to_string()));
        }
        Ok(())
    }

    fn page(&self, doc_type: &str, page: u32, page_size: u32) -> SearchResponse {
        let page_size = page_size.max(1);
        let matching: Vec<&Document> = self
            .documents
            .iter()
            .filter(|d| d.doc_type == doc_type)
            .collect();

        let total_pages = (matching.len() as u32).div_ceil(page_size);
        let start = (page.max(1) as usize - 1).saturating_mul(page_size as usize);
        let results = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect();

        let next_page = (page < total_pages).then(|| {
            format!(
                "{}{}?page={}&pageSize={}",
                CURSOR_SCHEME,
                doc_type,
                page + 1,
                page_size
            )
        });

        SearchResponse {
            page,
            total_pages,
            results,
            next_page,
        }
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<SearchResponse> {
        self.begin_request()?;
        Ok(self.page(doc_type, 1, page_size))
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>> {
        self.begin_request()?;
        Ok(self
            .documents
            .iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
            .cloned())
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        let foreign = || SourceError::ForeignCursor(cursor.to_string());

        let rest = cursor.strip_prefix(CURSOR_SCHEME).ok_or_else(foreign)?;
        let (doc_type, query) = rest.split_once('?').ok_or_else(foreign)?;

        let mut page = None;
        let mut page_size = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("page", v)) => page = v.parse::<u32>().ok(),
                Some(("pageSize", v)) => page_size = v.parse::<u32>().ok(),
                _ => {}
            }
        }

        let (page, page_size) = page.zip(page_size).ok_or_else(foreign)?;
        self.begin_request()?;
        Ok(self.page(doc_type, page, page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(uid: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "post".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            data: json!({ "title": uid }),
        }
    }

    #[tokio::test]
    async fn test_paging_through_cursors() {
        let source = MemorySource::new(vec![post("a"), post("b"), post("c")]);

        let first = source.query_by_type("post", 2).await.unwrap();
        assert_eq!(first.results.len(), 2);
        assert_eq!(first.total_pages, 2);
        let cursor = first.next_page.unwrap();
        assert_eq!(cursor, "memory://post?page=2&pageSize=2");

        let second = source.fetch_page(&cursor).await.unwrap();
        assert_eq!(second.results.len(), 1);
        assert_eq!(second.results[0].uid.as_deref(), Some("c"));
        assert_eq!(second.next_page, None);
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn test_filters_by_type_and_uid() {
        let mut page = post("about");
        page.doc_type = "page".to_string();
        let source = MemorySource::new(vec![post("a"), page]);

        let first = source.query_by_type("post", 10).await.unwrap();
        assert_eq!(first.results.len(), 1);
        assert!(source.get_by_uid("post", "about").await.unwrap().is_none());
        assert!(source.get_by_uid("page", "about").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_and_bad_cursor() {
        let source = MemorySource::new(vec![post("a")]);
        assert!(matches!(
            source.fetch_page("https://elsewhere/?page=2").await,
            Err(SourceError::ForeignCursor(_))
        ));

        source.set_offline(true);
        assert!(matches!(
            source.query_by_type("post", 1).await,
            Err(SourceError::Network(_))
        ));
    }

    #[tokio::test]
    async fn test_cursor_past_the_end_is_empty() {
        let source = MemorySource::new(vec![post("a"), post("b")]);

        let page = source
            .fetch_page("memory://post?page=4294967295&pageSize=2")
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next_page, None);

        let page = source
            .fetch_page("memory://post?page=3&pageSize=4294967295")
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_from_file_accepts_both_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let array = dir.path().join("array.json");
        fs::write(&array, serde_json::to_string(&vec![post("a")]).unwrap()).unwrap();
        let response = dir.path().join("response.json");
        fs::write(
            &response,
            json!({"results": [post("a"), post("b")], "next_page": null}).to_string(),
        )
        .unwrap();

        assert_eq!(MemorySource::from_file(&array).unwrap().documents.len(), 1);
        assert_eq!(MemorySource::from_file(&response).unwrap().documents.len(), 2);
    }
}
