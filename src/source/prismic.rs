//! HTTP client for a Prismic repository's REST API (v2)

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{ContentSource, Document, Result, SearchResponse, SourceError};

/// Client for `https://<repo>.cdn.prismic.io/api/v2`
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    /// Master ref, fetched once from the API entry point
    master_ref: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    pub fn new(endpoint: &str, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        }
    }

    async fn master_ref(&self) -> Result<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let root: ApiRoot = self.send(self.with_token(self.client.get(&self.endpoint))).await?;
                let reference = root
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or_else(|| SourceError::NoMasterRef(self.endpoint.clone()))?;
                tracing::debug!(reference = %reference, "Resolved master ref");
                Ok::<_, SourceError>(reference)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: &str, page_size: Option<u32>) -> Result<SearchResponse> {
        let reference = self.master_ref().await?;
        let url = format!("{}/documents/search", self.endpoint);

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", reference), ("q", predicate)]);
        if let Some(size) = page_size {
            request = request.query(&[("pageSize", size)]);
        }

        self.send(self.with_token(request)).await
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token)]),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Reject cursors that point anywhere but the configured API
    fn check_cursor(&self, cursor: &str) -> Result<Url> {
        let foreign = || SourceError::ForeignCursor(cursor.to_string());
        let cursor_url = Url::parse(cursor).map_err(|_| foreign())?;
        let endpoint_url = Url::parse(&self.endpoint).map_err(|_| foreign())?;

        if cursor_url.origin() != endpoint_url.origin() {
            return Err(foreign());
        }

        Ok(cursor_url)
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<SearchResponse> {
        tracing::debug!(doc_type, page_size, "Querying documents by type");
        self.search(&at_predicate("document.type", doc_type), Some(page_size))
            .await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Option<Document>> {
        tracing::debug!(doc_type, uid, "Fetching document by uid");
        let field = format!("my.{}.uid", doc_type);
        let response = self.search(&at_predicate(&field, uid), Some(1)).await?;
        Ok(response.results.into_iter().next())
    }

    async fn fetch_page(&self, cursor: &str) -> Result<SearchResponse> {
        let mut url = self.check_cursor(cursor)?;

        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }

        tracing::debug!("Following next_page cursor");
        self.send(self.client.get(url)).await
    }
}

/// `[[at(field, "value")]]`
fn at_predicate(field: &str, value: &str) -> String {
    let value = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"[[at({}, "{}")]]"#, field, value)
}
