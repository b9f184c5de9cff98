//! In-memory store for tests and development.
//!
//! Mirrors the Postgres store's observable behavior: cosine-ranked vector
//! search, trigram-similarity lexical search with the 0.1 floor, the
//! one-profile-per-category invariant, and draft CRUD. Data is lost on
//! restart.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{DraftingError, Result};
use crate::traits::store::{
    cosine_similarity, DocumentStore, DraftStore, DraftSummary, StoredDraft,
};
use crate::types::{ArticleType, Draft, Passage, StyleKind, StyleRecord};

/// In-memory article store.
#[derive(Default)]
pub struct MemoryStore {
    passages: RwLock<Vec<Passage>>,
    styles: RwLock<Vec<StyleRecord>>,
    drafts: RwLock<Vec<StoredDraft>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a passage.
    pub fn insert_passage(&self, passage: Passage) {
        self.passages.write().unwrap().push(passage);
    }

    /// Seed a style record, enforcing the profile uniqueness invariant.
    pub fn insert_style_record(&self, record: StyleRecord) -> Result<()> {
        let mut styles = self.styles.write().unwrap();
        if record.kind == StyleKind::Profile
            && styles
                .iter()
                .any(|s| s.kind == StyleKind::Profile && s.category == record.category)
        {
            return Err(DraftingError::Invariant(format!(
                "style profile already exists for {}",
                record.category
            )));
        }
        styles.push(record);
        Ok(())
    }

    pub fn passage_count(&self) -> usize {
        self.passages.read().unwrap().len()
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.read().unwrap().len()
    }
}

/// Character-trigram similarity, approximating pg_trgm: Jaccard overlap of
/// the two strings' trigram sets.
pub fn trigram_similarity(a: &str, b: &str) -> f32 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let shared = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    shared as f32 / union as f32
}

fn trigrams(text: &str) -> HashSet<String> {
    let chars: Vec<char> = text.to_lowercase().chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() < 3 {
        if chars.is_empty() {
            return HashSet::new();
        }
        return HashSet::from([chars.iter().collect()]);
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn vector_search(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let passages = self.passages.read().unwrap();

        let mut scored: Vec<(f32, Passage)> = passages
            .iter()
            .filter(|p| p.category == category)
            .filter_map(|p| {
                let embedding = p.embedding.as_ref()?;
                Some((cosine_similarity(query_vec, embedding), p.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, p)| p).collect())
    }

    async fn trigram_search(
        &self,
        query_text: &str,
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<Passage>> {
        let passages = self.passages.read().unwrap();

        let mut scored: Vec<(f32, Passage)> = passages
            .iter()
            .filter(|p| p.category == category)
            .filter_map(|p| {
                let similarity = trigram_similarity(&p.body, query_text);
                (similarity > 0.1).then(|| (similarity, p.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, p)| p).collect())
    }

    async fn style_profile(&self, category: ArticleType) -> Result<Option<StyleRecord>> {
        let styles = self.styles.read().unwrap();
        Ok(styles
            .iter()
            .find(|s| s.kind == StyleKind::Profile && s.category == category)
            .cloned())
    }

    async fn style_excerpts(
        &self,
        query_vec: &[f32],
        category: ArticleType,
        limit: usize,
    ) -> Result<Vec<StyleRecord>> {
        let styles = self.styles.read().unwrap();

        let mut scored: Vec<(f32, StyleRecord)> = styles
            .iter()
            .filter(|s| s.kind == StyleKind::Excerpt && s.category == category)
            .filter_map(|s| {
                let embedding = s.embedding.as_ref()?;
                Some((cosine_similarity(query_vec, embedding), s.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored.into_iter().map(|(_, s)| s).collect())
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn save_draft(&self, input_material: &str, draft: &Draft) -> Result<Uuid> {
        let mut drafts = self.drafts.write().unwrap();
        drafts.push(StoredDraft {
            id: draft.id,
            input_material: input_material.to_string(),
            category: draft.category,
            draft: draft.clone(),
            markdown: draft.to_markdown(),
            created_at: Utc::now(),
        });
        Ok(draft.id)
    }

    async fn list_drafts(&self, limit: usize, offset: usize) -> Result<Vec<DraftSummary>> {
        let drafts = self.drafts.read().unwrap();

        let mut entries: Vec<&StoredDraft> = drafts.iter().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(entries
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|d| DraftSummary {
                id: d.id,
                category: d.category,
                theme: d.draft.theme.clone(),
                created_at: d.created_at,
            })
            .collect())
    }

    async fn get_draft(&self, id: Uuid) -> Result<StoredDraft> {
        let drafts = self.drafts.read().unwrap();
        drafts
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| DraftingError::NotFound(format!("draft {id}")))
    }

    async fn delete_draft(&self, id: Uuid) -> Result<()> {
        let mut drafts = self.drafts.write().unwrap();
        let before = drafts.len();
        drafts.retain(|d| d.id != id);
        if drafts.len() == before {
            return Err(DraftingError::NotFound(format!("draft {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HeadingLevel;
    use crate::types::Section;

    fn passage(body: &str, category: ArticleType, embedding: Vec<f32>) -> Passage {
        Passage::new(body, category).with_embedding(embedding)
    }

    #[tokio::test]
    async fn test_vector_search_filters_category_and_ranks() {
        let store = MemoryStore::new();
        store.insert_passage(passage("記事A", ArticleType::Interview, vec![1.0, 0.0]));
        store.insert_passage(passage("記事B", ArticleType::Interview, vec![0.0, 1.0]));
        store.insert_passage(passage("記事C", ArticleType::Culture, vec![1.0, 0.0]));

        let results = store
            .vector_search(&[1.0, 0.0], ArticleType::Interview, 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].body, "記事A");
        assert!(results.iter().all(|p| p.category == ArticleType::Interview));
    }

    #[tokio::test]
    async fn test_trigram_search_applies_floor() {
        let store = MemoryStore::new();
        store.insert_passage(passage(
            "新入社員の挑戦を紹介します",
            ArticleType::Interview,
            vec![1.0],
        ));
        store.insert_passage(passage("全く関係ない話題", ArticleType::Interview, vec![1.0]));

        let results = store
            .trigram_search("新入社員の挑戦", ArticleType::Interview, 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].body.contains("新入社員"));
    }

    #[tokio::test]
    async fn test_profile_uniqueness_enforced() {
        let store = MemoryStore::new();
        store
            .insert_style_record(StyleRecord::new(
                ArticleType::Culture,
                StyleKind::Profile,
                "ルール",
            ))
            .unwrap();

        let err = store
            .insert_style_record(StyleRecord::new(
                ArticleType::Culture,
                StyleKind::Profile,
                "別のルール",
            ))
            .unwrap_err();
        assert_eq!(err.kind(), "invariant");

        // Excerpts are unlimited.
        store
            .insert_style_record(StyleRecord::new(
                ArticleType::Culture,
                StyleKind::Excerpt,
                "抜粋",
            ))
            .unwrap();
    }

    #[tokio::test]
    async fn test_draft_round_trip() {
        let store = MemoryStore::new();
        let mut draft = Draft {
            id: Uuid::new_v4(),
            titles: vec!["a".into(), "b".into(), "c".into()],
            lead: "リード".into(),
            sections: vec![Section {
                level: HeadingLevel::H2,
                heading: "h".into(),
                body: "本文".into(),
            }],
            closing: "締め".into(),
            category: ArticleType::Announcement,
            theme: "テーマ".into(),
            desired_length: 2000,
            actual_length: 0,
            tag_count: 0,
            consistency_score: 0.9,
            verification_confidence: 0.8,
        };
        draft.recompute();

        let id = store.save_draft("素材", &draft).await.unwrap();
        let stored = store.get_draft(id).await.unwrap();
        assert_eq!(stored.draft.titles, draft.titles);
        assert_eq!(stored.draft.actual_length, draft.actual_length);
        assert_eq!(stored.input_material, "素材");

        store.delete_draft(id).await.unwrap();
        assert_eq!(store.get_draft(id).await.unwrap_err().kind(), "not_found");
        assert_eq!(store.delete_draft(id).await.unwrap_err().kind(), "not_found");
    }

    #[test]
    fn test_trigram_similarity_identical() {
        assert!((trigram_similarity("同じ文章です", "同じ文章です") - 1.0).abs() < 1e-6);
        assert_eq!(trigram_similarity("", "abc"), 0.0);
    }
}
