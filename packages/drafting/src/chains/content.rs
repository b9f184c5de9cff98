//! Content generation chains: title, lead, section, closing.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{DraftingError, Result};
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{Outline, OutlineSection, Section, StructuredInput};

use super::analyzers::{StructureAnalysis, StyleAnalysis};
use super::{invoke_structured, prompts, Chain};

// =============================================================================
// Title
// =============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct TitleOutput {
    /// タイトル案（3つ）
    titles: Vec<String>,
}

pub struct TitleInput {
    pub input: StructuredInput,
    pub article_type_ja: String,
    pub outline: Outline,
    pub style_profile: String,
}

/// Generates exactly three candidate titles.
pub struct TitleChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl TitleChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for TitleChain {
    type Input = TitleInput;
    type Output = Vec<String>;

    async fn run(&self, input: TitleInput) -> Result<Vec<String>> {
        let output: TitleOutput = invoke_structured(
            self.gateway.as_ref(),
            ModelTier::High,
            0.7,
            prompts::TITLE_SYSTEM,
            &prompts::title_user(
                &input.input,
                &input.article_type_ja,
                &input.outline,
                &input.style_profile,
            ),
        )
        .await?;

        if output.titles.len() != 3 {
            return Err(DraftingError::Schema(format!(
                "expected exactly 3 titles, got {}",
                output.titles.len()
            )));
        }
        Ok(output.titles)
    }
}

// =============================================================================
// Lead
// =============================================================================

pub struct LeadInput {
    pub input: StructuredInput,
    pub article_type_ja: String,
    pub outline: Outline,
    pub style: StyleAnalysis,
    pub structure: StructureAnalysis,
    pub style_profile: String,
    pub style_excerpts: Vec<String>,
}

/// Generates the lead paragraph (100-150 characters target).
pub struct LeadChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl LeadChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for LeadChain {
    type Input = LeadInput;
    type Output = String;

    async fn run(&self, input: LeadInput) -> Result<String> {
        let lead = self
            .gateway
            .chat_text(
                ModelTier::High,
                0.5,
                prompts::LEAD_SYSTEM,
                &prompts::lead_user(
                    &input.input,
                    &input.article_type_ja,
                    &input.outline,
                    &input.style,
                    &input.structure,
                    &input.style_profile,
                    &input.style_excerpts,
                ),
            )
            .await?;
        Ok(lead.trim().to_string())
    }
}

// =============================================================================
// Section
// =============================================================================

pub struct SectionInput {
    pub section: OutlineSection,
    pub input: StructuredInput,
    pub article_type_ja: String,
    pub style: StyleAnalysis,
    pub style_profile: String,
    /// Bodies of the retrieved passages; the section must draw only on
    /// these and the input material.
    pub passages: Vec<String>,
}

/// Generates the body of one outline section.
pub struct SectionChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl SectionChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for SectionChain {
    type Input = SectionInput;
    type Output = Section;

    async fn run(&self, input: SectionInput) -> Result<Section> {
        let body = self
            .gateway
            .chat_text(
                ModelTier::High,
                0.5,
                prompts::SECTION_SYSTEM,
                &prompts::section_user(
                    &input.section,
                    &input.input,
                    &input.article_type_ja,
                    &input.style,
                    &input.style_profile,
                    &input.passages,
                ),
            )
            .await?;

        Ok(Section {
            level: input.section.level,
            heading: input.section.title,
            body: body.trim().to_string(),
        })
    }
}

// =============================================================================
// Closing
// =============================================================================

pub struct ClosingInput {
    pub input: StructuredInput,
    pub article_type_ja: String,
    pub outline: Outline,
    pub style: StyleAnalysis,
    pub structure: StructureAnalysis,
    pub style_profile: String,
}

/// Generates the closing text.
pub struct ClosingChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl ClosingChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for ClosingChain {
    type Input = ClosingInput;
    type Output = String;

    async fn run(&self, input: ClosingInput) -> Result<String> {
        let closing = self
            .gateway
            .chat_text(
                ModelTier::High,
                0.5,
                prompts::CLOSING_SYSTEM,
                &prompts::closing_user(
                    &input.input,
                    &input.article_type_ja,
                    &input.outline,
                    &input.style,
                    &input.structure,
                    &input.style_profile,
                ),
            )
            .await?;
        Ok(closing.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;
    use crate::types::HeadingLevel;

    fn outline() -> Outline {
        Outline {
            sections: vec![OutlineSection {
                level: HeadingLevel::H2,
                title: "はじめに".into(),
                summary: "導入".into(),
                key_sources: vec![],
                target_length: 300,
            }],
            total_target_length: 1500,
        }
    }

    #[tokio::test]
    async fn test_title_chain_requires_three() {
        let gateway = MockGateway::new(4).with_json(
            "タイトルを考える専門家",
            serde_json::json!({"titles": ["一つだけ"]}),
        );

        let chain = TitleChain::new(Arc::new(gateway));
        let err = chain
            .run(TitleInput {
                input: StructuredInput::default(),
                article_type_ja: "インタビュー".into(),
                outline: outline(),
                style_profile: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[tokio::test]
    async fn test_title_chain_returns_three() {
        let gateway = MockGateway::new(4).with_json(
            "タイトルを考える専門家",
            serde_json::json!({"titles": ["案1", "案2", "案3"]}),
        );

        let chain = TitleChain::new(Arc::new(gateway));
        let titles = chain
            .run(TitleInput {
                input: StructuredInput::default(),
                article_type_ja: "インタビュー".into(),
                outline: outline(),
                style_profile: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(titles.len(), 3);
    }

    #[tokio::test]
    async fn test_section_chain_keeps_outline_heading() {
        let gateway = MockGateway::new(4)
            .with_text("見出しの本文を執筆", "本文です。インタビュー引用は「」で使います。");

        let chain = SectionChain::new(Arc::new(gateway));
        let section = chain
            .run(SectionInput {
                section: OutlineSection {
                    level: HeadingLevel::H3,
                    title: "きっかけ".into(),
                    summary: "転職のきっかけ".into(),
                    key_sources: vec![],
                    target_length: 400,
                },
                input: StructuredInput::default(),
                article_type_ja: "インタビュー".into(),
                style: StyleAnalysis::default(),
                style_profile: String::new(),
                passages: vec!["参考".into()],
            })
            .await
            .unwrap();

        assert_eq!(section.heading, "きっかけ");
        assert_eq!(section.level, HeadingLevel::H3);
        assert!(section.body.starts_with("本文です。"));
    }
}
