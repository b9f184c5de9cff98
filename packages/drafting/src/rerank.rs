//! HTTP cross-encoder reranker.
//!
//! Talks to a text-embeddings-inference style `/rerank` endpoint that
//! scores (query, text) pairs jointly. The model is large and slow to
//! load server-side, so one client is constructed at startup and shared.
//! Initialization failure or a disabled flag yields `None` and callers
//! skip reranking entirely.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{DraftingError, Result};
use crate::traits::rerank::Reranker;

/// Cross-encoder reranker backed by an HTTP scoring service.
pub struct HttpReranker {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
    raw_scores: bool,
}

#[derive(Debug, Deserialize)]
struct RerankEntry {
    index: usize,
    score: f32,
}

impl HttpReranker {
    /// Create a reranker client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(DraftingError::Config("empty reranker URL".into()));
        }
        Ok(Self {
            http_client: reqwest::Client::new(),
            base_url,
        })
    }

    /// Build the shared reranker with graceful degradation: a missing URL
    /// or construction failure logs a warning and returns `None`.
    pub fn try_shared(base_url: Option<&str>) -> Option<Arc<dyn Reranker>> {
        let url = base_url?;
        match Self::new(url) {
            Ok(reranker) => {
                debug!(url, "reranker enabled");
                Some(Arc::new(reranker))
            }
            Err(e) => {
                warn!(error = %e, "reranker unavailable, continuing without reranking");
                None
            }
        }
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score_pairs(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            query,
            texts,
            raw_scores: true,
        };

        let response = self
            .http_client
            .post(format!("{}/rerank", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| DraftingError::Retrieval(format!("reranker request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DraftingError::Retrieval(format!(
                "reranker error ({status}): {body}"
            )));
        }

        let entries: Vec<RerankEntry> = response
            .json()
            .await
            .map_err(|e| DraftingError::Retrieval(format!("reranker response invalid: {e}")))?;

        if entries.len() != texts.len() {
            return Err(DraftingError::Retrieval(format!(
                "reranker returned {} scores for {} texts",
                entries.len(),
                texts.len()
            )));
        }

        // The service returns entries sorted by score; restore input order.
        let mut scores = vec![0.0; texts.len()];
        for entry in entries {
            let slot = scores.get_mut(entry.index).ok_or_else(|| {
                DraftingError::Retrieval(format!("reranker index {} out of range", entry.index))
            })?;
            *slot = entry.score;
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_rejected() {
        assert!(HttpReranker::new("").is_err());
    }

    #[test]
    fn test_try_shared_absent_without_url() {
        assert!(HttpReranker::try_shared(None).is_none());
    }

    #[test]
    fn test_try_shared_present_with_url() {
        assert!(HttpReranker::try_shared(Some("http://localhost:8080")).is_some());
    }
}
