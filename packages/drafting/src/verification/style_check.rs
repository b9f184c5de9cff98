//! Style consistency checking chain.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::chains::{invoke_structured, prompts, Chain, StyleAnalysis};
use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};

/// Severity of a style issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A single style inconsistency.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StyleIssue {
    /// 問題のある箇所（リード文、本文N段落目など）
    pub location: String,

    /// 問題の内容
    pub description: String,

    pub severity: Severity,
}

/// A suggested correction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CorrectedSection {
    /// 元のテキスト
    pub original: String,

    /// 修正後のテキスト
    pub corrected: String,

    /// 修正理由
    #[serde(default)]
    pub reason: String,
}

/// Result of the style consistency check.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StyleCheckResult {
    /// 文体が一貫しているか
    pub is_consistent: bool,

    /// 一貫性スコア（0-1）
    pub consistency_score: f32,

    /// 不一致箇所
    #[serde(default)]
    pub issues: Vec<StyleIssue>,

    /// 修正が必要な箇所の修正案
    #[serde(default)]
    pub corrected_sections: Vec<CorrectedSection>,
}

impl StyleCheckResult {
    /// The degraded result used when verification fails transiently.
    pub fn degraded() -> Self {
        Self {
            is_consistent: false,
            consistency_score: 0.0,
            issues: Vec::new(),
            corrected_sections: Vec::new(),
        }
    }
}

/// Input for the style check.
pub struct StyleCheckInput {
    pub draft_text: String,
    pub style: StyleAnalysis,
    pub style_profile: String,
}

/// Checks the composed draft against the style guide.
pub struct StyleCheckerChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl StyleCheckerChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for StyleCheckerChain {
    type Input = StyleCheckInput;
    type Output = StyleCheckResult;

    async fn run(&self, input: StyleCheckInput) -> Result<StyleCheckResult> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.1,
            prompts::STYLE_CHECK_SYSTEM,
            &prompts::style_check_user(&input.draft_text, &input.style, &input.style_profile),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    #[tokio::test]
    async fn test_check_parses_result() {
        let gateway = MockGateway::new(4).with_json(
            "文体の一貫性を検証する専門家",
            serde_json::json!({
                "is_consistent": false,
                "consistency_score": 0.72,
                "issues": [
                    {"location": "リード文", "description": "語尾が硬い", "severity": "medium"}
                ],
                "corrected_sections": [
                    {"original": "である。", "corrected": "です。", "reason": "語尾統一"}
                ],
            }),
        );

        let chain = StyleCheckerChain::new(Arc::new(gateway));
        let result = chain
            .run(StyleCheckInput {
                draft_text: "記事全文".into(),
                style: StyleAnalysis::default(),
                style_profile: "語尾は「です・ます」".into(),
            })
            .await
            .unwrap();

        assert!(!result.is_consistent);
        assert!((result.consistency_score - 0.72).abs() < 1e-6);
        assert_eq!(result.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_degraded_result() {
        let degraded = StyleCheckResult::degraded();
        assert_eq!(degraded.consistency_score, 0.0);
        assert!(degraded.issues.is_empty());
    }
}
