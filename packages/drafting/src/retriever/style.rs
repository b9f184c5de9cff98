//! Style-profile retrieval: the per-category rulebook and theme-matched
//! excerpts.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::traits::ai::LanguageGateway;
use crate::traits::rerank::{order_by_score, Reranker};
use crate::traits::store::DocumentStore;
use crate::types::ArticleType;

/// Retrieves the style rulebook and exemplar excerpts for a category.
pub struct StyleRetriever {
    gateway: Arc<dyn LanguageGateway>,
    store: Arc<dyn DocumentStore>,
    reranker: Option<Arc<dyn Reranker>>,
}

impl StyleRetriever {
    pub fn new(
        gateway: Arc<dyn LanguageGateway>,
        store: Arc<dyn DocumentStore>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Self {
        Self {
            gateway,
            store,
            reranker,
        }
    }

    /// The rulebook body for a category. There is at most one, so it is
    /// never reranked; a missing rulebook is an empty string.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn retrieve_profile(&self, category: ArticleType) -> Result<String> {
        let record = self.store.style_profile(category).await?;
        match record {
            Some(record) => Ok(record.body),
            None => {
                debug!(category = %category, "no style profile for category");
                Ok(String::new())
            }
        }
    }

    /// Excerpts matching the theme, ordered and deduplicated. Fetches
    /// twice the requested count so the reranker has candidates to work
    /// with; without a reranker the similarity ordering stands.
    #[instrument(skip(self), fields(category = %category, top_k))]
    pub async fn retrieve_excerpts(
        &self,
        theme: &str,
        category: ArticleType,
        top_k: usize,
    ) -> Result<Vec<String>> {
        let theme_vec = self.gateway.embed(theme).await?;
        let candidates = self
            .store
            .style_excerpts(&theme_vec, category, top_k * 2)
            .await?;

        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen: HashSet<Uuid> = HashSet::new();
        let unique: Vec<String> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.id))
            .map(|c| c.body)
            .collect();

        match &self.reranker {
            Some(reranker) if unique.len() > 1 => {
                let texts: Vec<&str> = unique.iter().map(|s| s.as_str()).collect();
                let scores = reranker.score_pairs(theme, &texts).await?;
                let ranked = order_by_score(&scores, top_k);
                Ok(ranked
                    .into_iter()
                    .map(|r| unique[r.index].clone())
                    .collect())
            }
            _ => Ok(unique.into_iter().take(top_k).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::{MockGateway, MockReranker};
    use crate::types::{StyleKind, StyleRecord};

    fn excerpt(category: ArticleType, body: &str, embedding: Vec<f32>) -> StyleRecord {
        StyleRecord::new(category, StyleKind::Excerpt, body).with_embedding(embedding)
    }

    #[tokio::test]
    async fn test_missing_profile_is_empty_string() {
        let store = Arc::new(MemoryStore::new());
        let retriever = StyleRetriever::new(Arc::new(MockGateway::new(2)), store, None);

        let profile = retriever
            .retrieve_profile(ArticleType::Culture)
            .await
            .unwrap();
        assert_eq!(profile, "");
    }

    #[tokio::test]
    async fn test_profile_body_returned() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_style_record(StyleRecord::new(
                ArticleType::Interview,
                StyleKind::Profile,
                "語尾は「です・ます」",
            ))
            .unwrap();

        let retriever = StyleRetriever::new(Arc::new(MockGateway::new(2)), store, None);
        let profile = retriever
            .retrieve_profile(ArticleType::Interview)
            .await
            .unwrap();
        assert_eq!(profile, "語尾は「です・ます」");
    }

    #[tokio::test]
    async fn test_excerpts_without_reranker_keep_similarity_order() {
        let gateway = Arc::new(MockGateway::new(2));
        let store = Arc::new(MemoryStore::new());
        let theme_vec = gateway.embedding_for("テーマ");
        store
            .insert_style_record(excerpt(ArticleType::Interview, "近い抜粋", theme_vec))
            .unwrap();
        store
            .insert_style_record(excerpt(ArticleType::Interview, "遠い抜粋", vec![-1.0, 0.2]))
            .unwrap();

        let retriever = StyleRetriever::new(gateway, store, None);
        let excerpts = retriever
            .retrieve_excerpts("テーマ", ArticleType::Interview, 1)
            .await
            .unwrap();
        assert_eq!(excerpts, vec!["近い抜粋".to_string()]);
    }

    #[tokio::test]
    async fn test_excerpts_reranked_when_available() {
        let gateway = Arc::new(MockGateway::new(2));
        let store = Arc::new(MemoryStore::new());
        let theme_vec = gateway.embedding_for("テーマ");
        store
            .insert_style_record(excerpt(ArticleType::Interview, "A", theme_vec.clone()))
            .unwrap();
        store
            .insert_style_record(excerpt(ArticleType::Interview, "B", theme_vec))
            .unwrap();

        let reranker = MockReranker::new().with_score("B", 5.0).with_score("A", 1.0);
        let retriever = StyleRetriever::new(gateway, store, Some(Arc::new(reranker)));

        let excerpts = retriever
            .retrieve_excerpts("テーマ", ArticleType::Interview, 2)
            .await
            .unwrap();
        assert_eq!(excerpts, vec!["B".to_string(), "A".to_string()]);
    }
}
