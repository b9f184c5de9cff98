//! Minimal client for OpenAI-compatible model endpoints.
//!
//! Covers the three operations the drafting pipeline needs: chat
//! completions, schema-constrained structured output, and embeddings.
//! No retries or domain logic here — callers own their retry policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{ChatRequest, LlmClient, Message};
//!
//! let client = LlmClient::new("sk-...").with_base_url("https://llm.internal/v1");
//!
//! let response = client
//!     .chat_completion(ChatRequest::new("draft-model").message(Message::user("こんにちは")))
//!     .await?;
//!
//! let vector = client.create_embedding("検索クエリ", "embed-model").await?;
//! ```

pub mod error;
pub mod schema;
pub mod types;

pub use error::{LlmError, Result};
pub use schema::StructuredOutput;
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    /// Create a client with the given API key and the default base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from the `LLM_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| LlmError::Config("LLM_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a different endpoint (proxy, self-hosted gateway).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Plain chat completion.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat request failed");
                LlmError::Network(e.to_string())
            })?;

        let raw: types::ChatResponseRaw = decode_response(response).await?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response contained no choices".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    /// Chat completion constrained to a JSON schema.
    ///
    /// Returns the raw JSON string emitted by the model; callers
    /// deserialize it against their own types.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "structured output request failed");
                LlmError::Network(e.to_string())
            })?;

        let raw: types::ChatResponseRaw = decode_response(response).await?;

        raw.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response contained no choices".into()))
    }

    /// Typed structured output.
    ///
    /// Derives the schema from `T` with `schemars`, sends it in strict
    /// mode, and deserializes the response.
    pub async fn extract<T: StructuredOutput>(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<T> {
        let schema = T::output_schema();
        debug!(type_name = %T::type_name(), "structured extraction");

        let request = StructuredRequest::new(model, system_prompt, user_prompt, schema);
        let json_str = self.structured_output(request).await?;

        serde_json::from_str(&json_str)
            .map_err(|e| LlmError::Parse(format!("failed to deserialize response: {e}")))
    }

    /// Embed a single text.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let mut vectors = self.create_embedding_batch(&[text], model).await?;
        vectors
            .pop()
            .ok_or_else(|| LlmError::Parse("no embedding in response".into()))
    }

    /// Embed a batch of texts. Order of the result matches the input.
    pub async fn create_embedding_batch(
        &self,
        texts: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = types::EmbeddingRequest {
            model: model.to_string(),
            input: texts.iter().map(|t| t.to_string()).collect(),
        };

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "embedding request failed");
                LlmError::Network(e.to_string())
            })?;

        let raw: types::EmbeddingResponse = decode_response(response).await?;

        if raw.data.len() != texts.len() {
            return Err(LlmError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                raw.data.len()
            )));
        }

        // The endpoint tags each vector with its input index; restore order.
        let mut data = raw.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Map the HTTP status to the error taxonomy and decode the body.
async fn decode_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status.as_u16() == 429 {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::RateLimited(body));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, body = %body, "API error response");
        return Err(LlmError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = LlmClient::new("sk-test").with_base_url("https://llm.example/v1");
        assert_eq!(client.base_url(), "https://llm.example/v1");
    }
}
