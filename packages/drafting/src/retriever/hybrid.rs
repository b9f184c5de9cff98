//! Hybrid search: vector + trigram lanes fused by Reciprocal Rank Fusion.
//!
//! RRF is rank-based rather than score-based, so it tolerates the
//! incomparable scales of cosine distance and trigram similarity. The two
//! lanes run concurrently; fusion and ordering happen here so the laws
//! (commutativity, deterministic tie-breaks) are unit-testable.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{DraftingError, Result};
use crate::traits::ai::LanguageGateway;
use crate::traits::rerank::{order_by_score, Reranker};
use crate::traits::store::DocumentStore;
use crate::types::{ArticleType, Passage};

/// RRF contribution of one list appearance: `1 / (k + rank)`.
pub fn rrf_score(rank: usize, k: u32) -> f64 {
    1.0 / (k as f64 + rank as f64)
}

/// A fused passage with its combined score and best observed rank.
#[derive(Debug, Clone)]
pub struct FusedPassage {
    pub passage: Passage,
    pub score: f64,
    pub best_rank: usize,
}

/// Fuse two ranked lists by RRF. Ranks are 1-based list positions.
/// Passages appearing in both lists are deduplicated by id with their
/// contributions summed. Ordering: score descending, then best rank
/// ascending, then id ascending.
pub fn fuse(a: &[Passage], b: &[Passage], rrf_k: u32) -> Vec<FusedPassage> {
    let mut by_id: HashMap<Uuid, FusedPassage> = HashMap::new();

    for list in [a, b] {
        for (idx, passage) in list.iter().enumerate() {
            let rank = idx + 1;
            let contribution = rrf_score(rank, rrf_k);
            by_id
                .entry(passage.id)
                .and_modify(|f| {
                    f.score += contribution;
                    f.best_rank = f.best_rank.min(rank);
                })
                .or_insert_with(|| FusedPassage {
                    passage: passage.clone(),
                    score: contribution,
                    best_rank: rank,
                });
        }
    }

    let mut fused: Vec<FusedPassage> = by_id.into_values().collect();
    fused.sort_by(|x, y| {
        y.score
            .partial_cmp(&x.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(x.best_rank.cmp(&y.best_rank))
            .then(x.passage.id.cmp(&y.passage.id))
    });
    fused
}

/// Hybrid searcher over the document store.
pub struct HybridSearcher {
    gateway: Arc<dyn LanguageGateway>,
    store: Arc<dyn DocumentStore>,
    reranker: Option<Arc<dyn Reranker>>,
    reranker_top_k: usize,
}

impl HybridSearcher {
    pub fn new(
        gateway: Arc<dyn LanguageGateway>,
        store: Arc<dyn DocumentStore>,
        reranker: Option<Arc<dyn Reranker>>,
        reranker_top_k: usize,
    ) -> Self {
        Self {
            gateway,
            store,
            reranker,
            reranker_top_k,
        }
    }

    /// Whether a cross-encoder is attached.
    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// Run the hybrid search. Returns ordered passages with `rrf_score`
    /// (and, after reranking, `rerank_score` / `rerank_score_normalized`)
    /// attached to the attribute bag.
    #[instrument(skip(self), fields(category = %category, k_per_source, final_k, rrf_k))]
    pub async fn search(
        &self,
        query_text: &str,
        category: ArticleType,
        k_per_source: usize,
        final_k: usize,
        rrf_k: u32,
    ) -> Result<Vec<Passage>> {
        // One embedding per query, reused by the vector lane.
        let query_vec = self.gateway.embed(query_text).await?;

        let (vector_lane, lexical_lane) = tokio::join!(
            self.store.vector_search(&query_vec, category, k_per_source),
            self.store.trigram_search(query_text, category, k_per_source),
        );

        // Half results would starve the downstream prompts of reference
        // breadth, so one failed lane fails the whole call.
        let vector_results = vector_lane.map_err(lane_failure)?;
        let lexical_results = lexical_lane.map_err(lane_failure)?;

        debug!(
            vector_count = vector_results.len(),
            lexical_count = lexical_results.len(),
            "search lanes completed"
        );

        if vector_results.is_empty() && lexical_results.is_empty() {
            return Ok(Vec::new());
        }

        let mut fused = fuse(&vector_results, &lexical_results, rrf_k);
        fused.truncate(final_k);

        let mut passages: Vec<Passage> = fused
            .into_iter()
            .map(|f| {
                let mut passage = f.passage;
                passage.set_attr("rrf_score", serde_json::json!(f.score));
                passage
            })
            .collect();

        if let Some(reranker) = &self.reranker {
            if final_k > self.reranker_top_k {
                passages = self.rerank(query_text, passages, reranker).await?;
            }
        }

        Ok(passages)
    }

    async fn rerank(
        &self,
        query_text: &str,
        passages: Vec<Passage>,
        reranker: &Arc<dyn Reranker>,
    ) -> Result<Vec<Passage>> {
        let bodies: Vec<&str> = passages.iter().map(|p| p.body.as_str()).collect();
        let scores = reranker.score_pairs(query_text, &bodies).await?;

        if scores.len() != passages.len() {
            warn!(
                scores = scores.len(),
                passages = passages.len(),
                "reranker score count mismatch, keeping RRF ordering"
            );
            return Ok(passages);
        }

        let ranked = order_by_score(&scores, self.reranker_top_k);
        let mut by_index: HashMap<usize, Passage> =
            passages.into_iter().enumerate().collect();

        Ok(ranked
            .into_iter()
            .filter_map(|r| {
                let mut passage = by_index.remove(&r.index)?;
                passage.set_attr("rerank_score", serde_json::json!(r.raw_score));
                passage.set_attr(
                    "rerank_score_normalized",
                    serde_json::json!(r.normalized_score),
                );
                Some(passage)
            })
            .collect())
    }
}

fn lane_failure(e: DraftingError) -> DraftingError {
    match e {
        DraftingError::Retrieval(msg) => DraftingError::Retrieval(msg),
        other => DraftingError::Retrieval(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: u128, body: &str) -> Passage {
        let mut p = Passage::new(body, ArticleType::Interview);
        p.id = Uuid::from_u128(id);
        p
    }

    #[test]
    fn test_rrf_identity() {
        for rank in 1..=50 {
            let score = rrf_score(rank, 60);
            assert!((score * (rank as f64 + 60.0) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fusion_sums_shared_passages() {
        let a = vec![passage(1, "x"), passage(2, "y")];
        let b = vec![passage(2, "y"), passage(3, "z")];

        let fused = fuse(&a, &b, 60);
        assert_eq!(fused.len(), 3);

        // id 2 appears at rank 2 in A and rank 1 in B.
        assert_eq!(fused[0].passage.id, Uuid::from_u128(2));
        let expected = rrf_score(2, 60) + rrf_score(1, 60);
        assert!((fused[0].score - expected).abs() < 1e-12);
        assert_eq!(fused[0].best_rank, 1);
    }

    #[test]
    fn test_fusion_is_commutative() {
        let a = vec![passage(1, "x"), passage(2, "y"), passage(3, "z")];
        let b = vec![passage(3, "z"), passage(4, "w")];

        let ab = fuse(&a, &b, 60);
        let ba = fuse(&b, &a, 60);

        let ids_ab: Vec<Uuid> = ab.iter().map(|f| f.passage.id).collect();
        let ids_ba: Vec<Uuid> = ba.iter().map(|f| f.passage.id).collect();
        assert_eq!(ids_ab, ids_ba);

        for (x, y) in ab.iter().zip(ba.iter()) {
            assert!((x.score - y.score).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fusion_scores_non_increasing() {
        let a: Vec<Passage> = (1..=5).map(|i| passage(i, "a")).collect();
        let b: Vec<Passage> = (3..=8).map(|i| passage(i, "b")).collect();

        let fused = fuse(&a, &b, 60);
        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_fusion_ties_break_by_rank_then_id() {
        // Two passages each appearing once at the same rank in different
        // lists tie on score and best_rank; the smaller id wins.
        let a = vec![passage(7, "x")];
        let b = vec![passage(2, "y")];

        let fused = fuse(&a, &b, 60);
        assert_eq!(fused[0].passage.id, Uuid::from_u128(2));
        assert_eq!(fused[1].passage.id, Uuid::from_u128(7));
    }

    #[test]
    fn test_fuse_empty_inputs() {
        assert!(fuse(&[], &[], 60).is_empty());
    }
}
