//! Article type classification chain.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{ArticleType, StructuredInput};

use super::{invoke_structured, prompts, Chain};

/// Classifier verdict.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Classification {
    /// 記事タイプ
    pub article_type: ArticleType,

    /// 判定の確信度（0-1）
    pub confidence: f32,

    /// 判定理由
    #[serde(default)]
    pub reason: String,

    /// 推奨される見出し構成（2-4個）
    #[serde(default)]
    pub suggested_headings: Vec<String>,
}

/// Classifies the brief into one of the four categories.
pub struct ArticleClassifierChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl ArticleClassifierChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for ArticleClassifierChain {
    type Input = StructuredInput;
    type Output = Classification;

    async fn run(&self, input: StructuredInput) -> Result<Classification> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.1,
            prompts::CLASSIFIER_SYSTEM,
            &prompts::classifier_user(&input),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    #[tokio::test]
    async fn test_classifies_announcement() {
        let gateway = MockGateway::new(4).with_json(
            "記事タイプを分類する専門家",
            serde_json::json!({
                "article_type": "ANNOUNCEMENT",
                "confidence": 0.92,
                "reason": "リリース告知が主目的",
                "suggested_headings": ["概要", "詳細"],
            }),
        );

        let chain = ArticleClassifierChain::new(Arc::new(gateway));
        let result = chain
            .run(StructuredInput {
                theme: "新サービスのリリース".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.article_type, ArticleType::Announcement);
        assert!(result.confidence >= 0.5);
    }

    #[tokio::test]
    async fn test_unknown_category_is_schema_error() {
        let gateway = MockGateway::new(4).with_json(
            "記事タイプを分類する専門家",
            serde_json::json!({"article_type": "PODCAST", "confidence": 0.9}),
        );

        let chain = ArticleClassifierChain::new(Arc::new(gateway));
        let err = chain.run(StructuredInput::default()).await.unwrap_err();
        assert_eq!(err.kind(), "schema");
    }
}
