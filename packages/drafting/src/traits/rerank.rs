//! Cross-encoder reranker seam.
//!
//! The reranker is optional everywhere: holders carry
//! `Option<Arc<dyn Reranker>>` and absence means callers keep their
//! pre-rerank ordering (graceful degradation, not an error).

use async_trait::async_trait;

use crate::error::Result;

/// Cross-encoder scoring of (query, text) pairs.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Raw relevance scores, one per text, in input order.
    async fn score_pairs(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>>;
}

/// Sigmoid normalization mapping a raw cross-encoder score into (0, 1).
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A rerank result: input index with raw and normalized scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedIndex {
    pub index: usize,
    pub raw_score: f32,
    pub normalized_score: f32,
}

/// Order indices by raw score descending, ties broken by input order, and
/// keep the top `top_k`.
pub fn order_by_score(scores: &[f32], top_k: usize) -> Vec<RankedIndex> {
    let mut ranked: Vec<RankedIndex> = scores
        .iter()
        .enumerate()
        .map(|(index, &raw_score)| RankedIndex {
            index,
            raw_score,
            normalized_score: sigmoid(raw_score),
        })
        .collect();

    // Stable sort keeps input order for equal raw scores.
    ranked.sort_by(|a, b| {
        b.raw_score
            .partial_cmp(&a.raw_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_order_by_score_descending() {
        let ranked = order_by_score(&[0.1, 2.0, -1.0], 3);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert!(ranked[0].normalized_score > ranked[1].normalized_score);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let ranked = order_by_score(&[1.0, 1.0, 1.0], 3);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_top_k_truncation() {
        let ranked = order_by_score(&[0.5, 0.4, 0.3, 0.2], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 0);
    }
}
