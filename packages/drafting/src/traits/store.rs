//! Storage traits for the document corpus and generation history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{ArticleType, Draft, Passage, StyleRecord};

/// Read API over the passage corpus and style assets.
///
/// Both search operations emit results in rank order (rank 1 first); the
/// hybrid searcher derives ranks from positions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Up to `limit` passages of the category, ordered by cosine distance
    /// to `query_vec`, ascending.
    async fn vector_search(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>>;

    /// Up to `limit` passages of the category whose trigram similarity to
    /// `query_text` exceeds 0.1, ordered by similarity descending.
    async fn trigram_search(
        &self,
        query_text: &str,
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>>;

    /// The unique style record of kind `profile` for the category, if any.
    async fn style_profile(&self, category: ArticleType) -> Result<Option<StyleRecord>>;

    /// Up to `limit` records of kind `excerpt` for the category, ordered
    /// by cosine distance to `query_vec`, ascending.
    async fn style_excerpts(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<StyleRecord>>;
}

/// Append-only history of past generations.
///
/// Writes are best-effort from the pipeline's point of view; reads return
/// `NotFound` for unknown ids.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Persist a generation. Returns the draft id.
    async fn save_draft(&self, input_material: &str, draft: &Draft) -> Result<Uuid>;

    /// Past generations, newest first.
    async fn list_drafts(&self, limit: usize, offset: usize) -> Result<Vec<DraftSummary>>;

    /// Fetch one generation by id.
    async fn get_draft(&self, id: Uuid) -> Result<StoredDraft>;

    /// Delete one generation by id.
    async fn delete_draft(&self, id: Uuid) -> Result<()>;
}

/// Composite store used by the pipeline.
pub trait ArticleStore: DocumentStore + DraftStore {}

impl<T: DocumentStore + DraftStore> ArticleStore for T {}

/// List entry for the history surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSummary {
    pub id: Uuid,
    pub category: ArticleType,
    pub theme: String,
    pub created_at: DateTime<Utc>,
}

/// A persisted generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDraft {
    pub id: Uuid,
    pub input_material: String,
    pub category: ArticleType,
    pub draft: Draft,
    pub markdown: String,
    pub created_at: DateTime<Utc>,
}

/// Cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[1.0, 0.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_dimension_mismatch_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
