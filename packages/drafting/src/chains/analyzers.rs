//! Style and structure analysis chains over the retrieved references.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};

use super::{invoke_structured, prompts, Chain};

/// Writing-style characteristics extracted from reference passages.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StyleAnalysis {
    /// よく使われる語尾パターン
    pub sentence_endings: Vec<String>,

    /// 全体的なトーン
    pub tone: String,

    /// 使われている一人称
    #[serde(default = "default_first_person")]
    pub first_person: String,

    /// 読者への呼びかけ方
    #[serde(default)]
    pub reader_address: String,

    /// 段落の長さや区切り方の傾向
    #[serde(default)]
    pub paragraph_style: String,

    /// 絵文字の使用有無と頻度
    #[serde(default)]
    pub emoji_usage: String,

    /// 特徴的なフレーズや言い回し
    #[serde(default)]
    pub characteristic_phrases: Vec<String>,
}

fn default_first_person() -> String {
    "私".to_string()
}

impl Default for StyleAnalysis {
    /// Fallback when no references were retrieved.
    fn default() -> Self {
        Self {
            sentence_endings: vec!["です".into(), "ます".into()],
            tone: "フォーマル".into(),
            first_person: default_first_person(),
            reader_address: String::new(),
            paragraph_style: String::new(),
            emoji_usage: String::new(),
            characteristic_phrases: Vec::new(),
        }
    }
}

/// Structure patterns extracted from reference passages.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StructureAnalysis {
    /// よく使われる見出しパターン
    pub typical_headings: Vec<String>,

    /// リード文の書き方パターン
    pub intro_pattern: String,

    /// セクションの流れ
    #[serde(default)]
    pub section_flow: String,

    /// 締めの文章パターン
    pub closing_pattern: String,
}

impl Default for StructureAnalysis {
    fn default() -> Self {
        Self {
            typical_headings: vec!["はじめに".into(), "本題".into(), "まとめ".into()],
            intro_pattern: "テーマの紹介から始める".into(),
            section_flow: "導入→展開→まとめ".into(),
            closing_pattern: "CTAで締める".into(),
        }
    }
}

/// Input shared by both analyzers.
pub struct AnalyzerInput {
    pub references: Vec<String>,
    pub article_type_ja: String,
}

/// Extracts the writing style of the reference passages.
pub struct StyleAnalyzerChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl StyleAnalyzerChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for StyleAnalyzerChain {
    type Input = AnalyzerInput;
    type Output = StyleAnalysis;

    async fn run(&self, input: AnalyzerInput) -> Result<StyleAnalysis> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.2,
            prompts::STYLE_ANALYZER_SYSTEM,
            &prompts::style_analyzer_user(&input.references, &input.article_type_ja),
        )
        .await
    }
}

/// Extracts the structural patterns of the reference passages.
pub struct StructureAnalyzerChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl StructureAnalyzerChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for StructureAnalyzerChain {
    type Input = AnalyzerInput;
    type Output = StructureAnalysis;

    async fn run(&self, input: AnalyzerInput) -> Result<StructureAnalysis> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.2,
            prompts::STRUCTURE_ANALYZER_SYSTEM,
            &prompts::structure_analyzer_user(&input.references, &input.article_type_ja),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    #[tokio::test]
    async fn test_style_analyzer_parses_summary() {
        let gateway = MockGateway::new(4).with_json(
            "文章スタイルを分析する専門家",
            serde_json::json!({
                "sentence_endings": ["〜ですね", "〜なんです"],
                "tone": "カジュアル",
                "first_person": "僕",
                "characteristic_phrases": ["ワクワク"],
            }),
        );

        let chain = StyleAnalyzerChain::new(Arc::new(gateway));
        let analysis = chain
            .run(AnalyzerInput {
                references: vec!["過去記事本文".into()],
                article_type_ja: "インタビュー".into(),
            })
            .await
            .unwrap();

        assert_eq!(analysis.tone, "カジュアル");
        assert_eq!(analysis.first_person, "僕");
    }

    #[test]
    fn test_defaults_when_no_references() {
        let style = StyleAnalysis::default();
        assert_eq!(style.sentence_endings, vec!["です", "ます"]);
        assert_eq!(style.tone, "フォーマル");

        let structure = StructureAnalysis::default();
        assert_eq!(structure.closing_pattern, "CTAで締める");
    }
}
