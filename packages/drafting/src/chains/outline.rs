//! Outline generation chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DraftingError, Result};
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{Outline, StructuredInput};

use super::analyzers::{StructureAnalysis, StyleAnalysis};
use super::{invoke_structured, prompts, Chain};

/// Everything the outline prompt draws on.
pub struct OutlineInput {
    pub input: StructuredInput,
    pub article_type_ja: String,
    pub style: StyleAnalysis,
    pub structure: StructureAnalysis,
    pub style_profile: String,
    pub style_excerpts: Vec<String>,
    pub references: Vec<String>,
}

/// Generates the article outline.
pub struct OutlineChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl OutlineChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for OutlineChain {
    type Input = OutlineInput;
    type Output = Outline;

    async fn run(&self, input: OutlineInput) -> Result<Outline> {
        let outline: Outline = invoke_structured(
            self.gateway.as_ref(),
            ModelTier::High,
            0.5,
            prompts::OUTLINE_SYSTEM,
            &prompts::outline_user(
                &input.input,
                &input.article_type_ja,
                &input.style,
                &input.structure,
                &input.style_profile,
                &input.style_excerpts,
                &input.references,
            ),
        )
        .await?;

        if outline.sections.is_empty() || outline.sections.len() > 4 {
            return Err(DraftingError::Schema(format!(
                "outline must have 1-4 sections, got {}",
                outline.sections.len()
            )));
        }
        Ok(outline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    fn outline_input() -> OutlineInput {
        OutlineInput {
            input: StructuredInput {
                theme: "入社エントリ".into(),
                ..Default::default()
            },
            article_type_ja: "インタビュー".into(),
            style: StyleAnalysis::default(),
            structure: StructureAnalysis::default(),
            style_profile: String::new(),
            style_excerpts: Vec::new(),
            references: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_outline_generated_on_high_tier() {
        let gateway = Arc::new(MockGateway::new(4).with_json(
            "記事構成の専門家",
            serde_json::json!({
                "sections": [
                    {"level": "H2", "title": "はじめに", "summary": "導入", "target_length": 300},
                    {"level": "H2", "title": "本題", "summary": "詳細", "target_length": 600},
                ],
                "total_target_length": 1500,
            }),
        ));

        let chain = OutlineChain::new(gateway.clone());
        let outline = chain.run(outline_input()).await.unwrap();

        assert_eq!(outline.sections.len(), 2);
        assert_eq!(gateway.tier_of_last_call(), Some(ModelTier::High));
    }

    #[tokio::test]
    async fn test_empty_outline_rejected() {
        let gateway = MockGateway::new(4).with_json(
            "記事構成の専門家",
            serde_json::json!({"sections": [], "total_target_length": 1500}),
        );

        let chain = OutlineChain::new(Arc::new(gateway));
        let err = chain.run(outline_input()).await.unwrap_err();
        assert_eq!(err.kind(), "schema");
    }
}
