//! Tiered gateway over the LLM client.
//!
//! Owns the cross-cutting call policy: tier-to-model routing, the hard
//! per-call timeout, and retry of transient failures with exponential
//! backoff. Schema failures are never retried.

use std::time::Duration;

use async_trait::async_trait;
use llm_client::{LlmClient, LlmError, StructuredRequest};
use tracing::{debug, warn};

use crate::error::{DraftingError, Result};
use crate::traits::ai::{LanguageGateway, ModelTier, EMBEDDING_DIM};

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Process-wide gateway to the chat and embedding models. Safe for
/// concurrent use; construct once at startup.
pub struct TieredGateway {
    client: LlmClient,
    model_high: String,
    model_lite: String,
    embedding_model: String,
    /// When false, the lite tier is routed to the high model.
    use_lite_model: bool,
    call_timeout: Duration,
}

impl TieredGateway {
    pub fn new(
        client: LlmClient,
        model_high: impl Into<String>,
        model_lite: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            model_high: model_high.into(),
            model_lite: model_lite.into(),
            embedding_model: embedding_model.into(),
            use_lite_model: true,
            call_timeout: Duration::from_secs(60),
        }
    }

    /// Disable tier routing; every call falls back to the high model.
    pub fn with_lite_routing(mut self, enabled: bool) -> Self {
        self.use_lite_model = enabled;
        self
    }

    /// Override the per-call deadline (default 60 s).
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Lite if self.use_lite_model => &self.model_lite,
            _ => &self.model_high,
        }
    }

    /// Run an upstream call under the per-call timeout, retrying transient
    /// failures up to [`MAX_ATTEMPTS`] with exponential backoff.
    async fn call_with_retry<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, LlmError>>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 2);
                debug!(what, attempt, backoff_ms = backoff.as_millis() as u64, "retrying");
                tokio::time::sleep(backoff).await;
            }

            match tokio::time::timeout(self.call_timeout, call()).await {
                Err(_) => {
                    warn!(what, attempt, timeout_s = self.call_timeout.as_secs(), "call timed out");
                    return Err(DraftingError::Timeout(self.call_timeout));
                }
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_transient() => {
                    warn!(what, attempt, error = %e, "transient upstream failure");
                    last_error = Some(e);
                }
                Ok(Err(LlmError::Parse(msg))) => {
                    return Err(DraftingError::Schema(msg));
                }
                Ok(Err(e)) => {
                    return Err(DraftingError::Upstream(e.to_string()));
                }
            }
        }

        Err(DraftingError::Upstream(format!(
            "{what} failed after {MAX_ATTEMPTS} attempts: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[async_trait]
impl LanguageGateway for TieredGateway {
    async fn chat_json(
        &self,
        tier: ModelTier,
        temperature: f32,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let model = self.model_for(tier).to_string();
        debug!(tier = tier.as_str(), model = %model, "structured chat call");

        let raw = self
            .call_with_retry("chat_json", || {
                let request =
                    StructuredRequest::new(&model, system, user, schema.clone())
                        .temperature(temperature);
                self.client.structured_output(request)
            })
            .await?;

        serde_json::from_str(&raw)
            .map_err(|e| DraftingError::Schema(format!("model emitted invalid JSON: {e}")))
    }

    async fn chat_text(
        &self,
        tier: ModelTier,
        temperature: f32,
        system: &str,
        user: &str,
    ) -> Result<String> {
        let model = self.model_for(tier).to_string();
        debug!(tier = tier.as_str(), model = %model, "text chat call");

        let response = self
            .call_with_retry("chat_text", || {
                let request = llm_client::ChatRequest::new(&model)
                    .message(llm_client::Message::system(system))
                    .message(llm_client::Message::user(user))
                    .temperature(temperature);
                self.client.chat_completion(request)
            })
            .await?;

        Ok(response.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self
            .call_with_retry("embed", || {
                self.client.create_embedding(text, &self.embedding_model)
            })
            .await?;

        if vector.len() != EMBEDDING_DIM {
            return Err(DraftingError::Upstream(format!(
                "embedding model returned {} dimensions, expected {EMBEDDING_DIM}",
                vector.len()
            )));
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = self
            .call_with_retry("embed_batch", || {
                self.client
                    .create_embedding_batch(texts, &self.embedding_model)
            })
            .await?;

        if let Some(bad) = vectors.iter().find(|v| v.len() != EMBEDDING_DIM) {
            return Err(DraftingError::Upstream(format!(
                "embedding model returned {} dimensions, expected {EMBEDDING_DIM}",
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(lite_enabled: bool) -> TieredGateway {
        TieredGateway::new(
            LlmClient::new("sk-test"),
            "model-high",
            "model-lite",
            "model-embed",
        )
        .with_lite_routing(lite_enabled)
    }

    #[test]
    fn test_tier_routing() {
        let g = gateway(true);
        assert_eq!(g.model_for(ModelTier::High), "model-high");
        assert_eq!(g.model_for(ModelTier::Lite), "model-lite");
    }

    #[test]
    fn test_lite_routing_disabled_falls_back_to_high() {
        let g = gateway(false);
        assert_eq!(g.model_for(ModelTier::Lite), "model-high");
        assert_eq!(g.model_for(ModelTier::High), "model-high");
    }
}
