//! Corpus types: article categories, passages, and style records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DraftingError;

/// The four article categories. Partitions the corpus and selects the
/// style rulebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArticleType {
    Announcement,
    EventReport,
    Interview,
    Culture,
}

impl ArticleType {
    pub const ALL: [ArticleType; 4] = [
        ArticleType::Announcement,
        ArticleType::EventReport,
        ArticleType::Interview,
        ArticleType::Culture,
    ];

    /// Wire form, matching the `article_category` Postgres enum.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::Announcement => "ANNOUNCEMENT",
            ArticleType::EventReport => "EVENT_REPORT",
            ArticleType::Interview => "INTERVIEW",
            ArticleType::Culture => "CULTURE",
        }
    }

    /// Localized category label for the metadata footer.
    pub fn label_ja(&self) -> &'static str {
        match self {
            ArticleType::Announcement => "アナウンスメント",
            ArticleType::EventReport => "イベントレポート",
            ArticleType::Interview => "インタビュー",
            ArticleType::Culture => "カルチャー/ストーリー",
        }
    }
}

impl fmt::Display for ArticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleType {
    type Err = DraftingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANNOUNCEMENT" => Ok(ArticleType::Announcement),
            "EVENT_REPORT" => Ok(ArticleType::EventReport),
            "INTERVIEW" => Ok(ArticleType::Interview),
            "CULTURE" => Ok(ArticleType::Culture),
            other => Err(DraftingError::Schema(format!(
                "unknown article category: {other}"
            ))),
        }
    }
}

/// A content chunk from the corpus. Created by the external ingester and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: Uuid,
    pub body: String,
    /// Attribute bag. Search attaches `rrf_score` here; reranking attaches
    /// `rerank_score` and `rerank_score_normalized`.
    #[serde(default)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
    /// Nullable only while the ingester is still embedding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub category: ArticleType,
    pub source: String,
    pub chunk_index: i32,
    pub total_chunks: i32,
    pub created_at: DateTime<Utc>,
}

impl Passage {
    /// Build a passage with sensible defaults, mainly for tests and seeding.
    pub fn new(body: impl Into<String>, category: ArticleType) -> Self {
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            attrs: serde_json::Map::new(),
            embedding: None,
            category,
            source: String::new(),
            chunk_index: 0,
            total_chunks: 1,
            created_at: Utc::now(),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Attach an attribute, replacing any previous value.
    pub fn set_attr(&mut self, key: &str, value: serde_json::Value) {
        self.attrs.insert(key.to_string(), value);
    }
}

/// Style asset kind. Each category has at most one `Profile` and any
/// number of `Excerpt` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Profile,
    Excerpt,
}

impl StyleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKind::Profile => "profile",
            StyleKind::Excerpt => "excerpt",
        }
    }
}

impl FromStr for StyleKind {
    type Err = DraftingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profile" => Ok(StyleKind::Profile),
            "excerpt" => Ok(StyleKind::Excerpt),
            other => Err(DraftingError::Schema(format!("unknown style kind: {other}"))),
        }
    }
}

/// A style rulebook or exemplar excerpt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRecord {
    pub id: Uuid,
    pub category: ArticleType,
    pub kind: StyleKind,
    pub body: String,
    /// Present on both kinds; only excerpts are retrieved by similarity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StyleRecord {
    pub fn new(category: ArticleType, kind: StyleKind, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            category,
            kind,
            body: body.into(),
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_round_trip() {
        for ty in ArticleType::ALL {
            assert_eq!(ty.as_str().parse::<ArticleType>().unwrap(), ty);
        }
    }

    #[test]
    fn test_serde_uses_wire_form() {
        let json = serde_json::to_string(&ArticleType::EventReport).unwrap();
        assert_eq!(json, "\"EVENT_REPORT\"");
    }

    #[test]
    fn test_labels() {
        assert_eq!(ArticleType::Announcement.label_ja(), "アナウンスメント");
        assert_eq!(ArticleType::Culture.label_ja(), "カルチャー/ストーリー");
    }

    #[test]
    fn test_unknown_category_rejected() {
        assert!("NEWSLETTER".parse::<ArticleType>().is_err());
    }
}
