//! Gateway trait for the external embedding and chat models.

use async_trait::async_trait;

use crate::error::Result;

/// Embedding dimension of the corpus. The document store's vector columns
/// are sized to this.
pub const EMBEDDING_DIM: usize = 768;

/// Model quality tier.
///
/// `Lite` serves parsing, classification, query generation, analysis, and
/// verification; `High` serves outline, title, lead, section, closing, and
/// rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    High,
    Lite,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::High => "high",
            ModelTier::Lite => "lite",
        }
    }
}

/// Uniform request surface over the embedding model and the two chat
/// tiers. Implementations own timeouts and transient-error retries.
#[async_trait]
pub trait LanguageGateway: Send + Sync {
    /// Chat completion constrained to the given JSON schema. The returned
    /// value is decoded JSON; typed decoding happens in the chain.
    async fn chat_json(
        &self,
        tier: ModelTier,
        temperature: f32,
        system: &str,
        user: &str,
        schema: serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Free-text chat completion.
    async fn chat_text(
        &self,
        tier: ModelTier,
        temperature: f32,
        system: &str,
        user: &str,
    ) -> Result<String>;

    /// Embed a single text into a 768-dimensional vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. Order matches the input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}
