//! Content source - the headless content API posts are read from
//!
//! [`ContentSource`] is the seam between the site and the API. The
//! [`PrismicClient`] talks HTTP to a Prismic repository; [`MemorySource`]
//! serves documents held in memory (tests and offline builds).

mod error;
mod memory;
mod prismic;

pub use error::{Result, SourceError};
pub use memory::MemorySource;
pub use prismic::PrismicClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A raw document as returned by the content API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub doc_type: String,
    #[serde(default)]
    pub first_publication_date: Option<String>,
    #[serde(default)]
    pub last_publication_date: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<Document>,
    /// Cursor for the following page
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Query capability over the content API
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents of a type
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<SearchResponse>;

    /// The document of a type with the given uid, if any
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>>;

    /// Follow a `next_page` cursor
    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse>;
}
