//! Input material parsing chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::StructuredInput;

use super::{invoke_structured, prompts, Chain};

/// Parses free-form input material into a [`StructuredInput`] brief.
pub struct InputParserChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl InputParserChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for InputParserChain {
    type Input = String;
    type Output = StructuredInput;

    async fn run(&self, input_material: String) -> Result<StructuredInput> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.2,
            prompts::INPUT_PARSER_SYSTEM,
            &prompts::input_parser_user(&input_material),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    #[tokio::test]
    async fn test_parses_structured_input() {
        let gateway = MockGateway::new(4).with_json(
            "入力素材を構造化するエキスパート",
            serde_json::json!({
                "theme": "新サービスのリリース",
                "keywords": ["リリース", "BtoB"],
                "data_facts": ["2025-03-01"],
            }),
        );

        let chain = InputParserChain::new(Arc::new(gateway));
        let parsed = chain.run("素材テキスト".to_string()).await.unwrap();

        assert_eq!(parsed.theme, "新サービスのリリース");
        assert_eq!(parsed.desired_length, 2000);
        assert_eq!(parsed.keywords.len(), 2);
    }

    #[tokio::test]
    async fn test_uses_lite_tier() {
        let gateway = Arc::new(MockGateway::new(4).with_json(
            "入力素材",
            serde_json::json!({"theme": "t"}),
        ));
        let chain = InputParserChain::new(gateway.clone());
        chain.run("素材".to_string()).await.unwrap();

        assert_eq!(gateway.tier_of_last_call(), Some(ModelTier::Lite));
    }
}
