//! Search engine client
//!
//! [`SearchEngine`] is the seam between this service and the external engine;
//! the HTTP implementation talks a minimal document-store REST contract.
//! Upsert and delete are idempotent: re-applying a write for the same item
//! always converges to the latest submitted state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{BookFormat, SearchDocument};

/// Engine unreachable or misbehaving. During indexing this is retried then
/// dropped; during querying it triggers the fallback scan. Never surfaced as a
/// request failure.
#[derive(Debug, thiserror::Error)]
#[error("Search engine unavailable: {0}")]
pub struct SearchError(pub String);

/// Query with filters, as the engine and the fallback scan both interpret it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchQuery {
    /// Free-text query; fallback treats it as a title/description substring
    pub q: Option<String>,
    /// ISO 639-1 language equality filter
    pub language: Option<String>,
    pub format: Option<BookFormat>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
}

/// One page of engine hits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    pub hits: Vec<SearchDocument>,
    pub total: u64,
}

#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn upsert(&self, doc: &SearchDocument) -> Result<(), SearchError>;
    async fn delete(&self, id: i64) -> Result<(), SearchError>;
    async fn delete_many(&self, ids: &[i64]) -> Result<(), SearchError>;
    async fn bulk_upsert(&self, docs: &[SearchDocument]) -> Result<(), SearchError>;
    async fn query(&self, query: &SearchQuery) -> Result<SearchPage, SearchError>;
    async fn suggest(&self, prefix: &str) -> Result<Vec<String>, SearchError>;
}

/// HTTP client for the external engine.
#[derive(Debug, Clone)]
pub struct HttpSearchEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSearchEngine {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_millis(timeout_ms))
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/books{}", self.base_url.trim_end_matches('/'), path)
    }

    fn check(status: reqwest::StatusCode) -> Result<(), SearchError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(SearchError(format!("Engine returned {status}")))
        }
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn upsert(&self, doc: &SearchDocument) -> Result<(), SearchError> {
        let response = self
            .client
            .put(self.url(&format!("/{}", doc.id)))
            .json(doc)
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        Self::check(response.status())
    }

    async fn delete(&self, id: i64) -> Result<(), SearchError> {
        let response = self
            .client
            .delete(self.url(&format!("/{id}")))
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        // Deleting an absent document is a no-op, not a failure.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check(response.status())
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<(), SearchError> {
        let response = self
            .client
            .post(self.url("/_delete"))
            .json(&serde_json::json!({ "ids": ids }))
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        Self::check(response.status())
    }

    async fn bulk_upsert(&self, docs: &[SearchDocument]) -> Result<(), SearchError> {
        let response = self
            .client
            .post(self.url("/_bulk"))
            .json(docs)
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        Self::check(response.status())
    }

    async fn query(&self, query: &SearchQuery) -> Result<SearchPage, SearchError> {
        let response = self
            .client
            .post(self.url("/_search"))
            .json(query)
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        Self::check(response.status())?;
        response
            .json()
            .await
            .map_err(|e| SearchError(format!("Malformed engine payload: {e}")))
    }

    async fn suggest(&self, prefix: &str) -> Result<Vec<String>, SearchError> {
        let response = self
            .client
            .get(self.url("/_suggest"))
            .query(&[("prefix", prefix)])
            .send()
            .await
            .map_err(|e| SearchError(e.to_string()))?;
        Self::check(response.status())?;
        response
            .json()
            .await
            .map_err(|e| SearchError(format!("Malformed engine payload: {e}")))
    }
}
