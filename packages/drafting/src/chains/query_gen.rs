//! Search query generation chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{ArticleType, StructuredInput};

use super::{prompts, Chain};

/// Input for query generation.
pub struct QueryGenInput {
    pub input: StructuredInput,
    pub category: ArticleType,
}

/// Generates a whitespace-joined keyword query optimized for the category.
pub struct QueryGeneratorChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl QueryGeneratorChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }

    /// Strip prefixes and quoting the model sometimes wraps the keywords in.
    fn clean_query(raw: &str) -> String {
        let mut cleaned = raw.trim();
        for prefix in ["search_query:", "クエリ:", "検索クエリ:"] {
            if let Some(rest) = strip_prefix_ignore_case(cleaned, prefix) {
                cleaned = rest.trim();
            }
        }
        cleaned.trim_matches(['"', '\'']).trim().to_string()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

#[async_trait]
impl Chain for QueryGeneratorChain {
    type Input = QueryGenInput;
    type Output = String;

    async fn run(&self, input: QueryGenInput) -> Result<String> {
        let raw = self
            .gateway
            .chat_text(
                ModelTier::Lite,
                0.3,
                prompts::QUERY_GEN_SYSTEM,
                &prompts::query_gen_user(&input.input, input.category.as_str()),
            )
            .await?;

        Ok(Self::clean_query(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;

    #[test]
    fn test_clean_query_strips_prefixes() {
        assert_eq!(
            QueryGeneratorChain::clean_query("search_query: \"入社 キャリア 働き方\""),
            "入社 キャリア 働き方"
        );
        assert_eq!(
            QueryGeneratorChain::clean_query("検索クエリ: リリース 新機能"),
            "リリース 新機能"
        );
        assert_eq!(QueryGeneratorChain::clean_query("  そのまま  "), "そのまま");
    }

    #[tokio::test]
    async fn test_generates_cleaned_query() {
        let gateway = MockGateway::new(4)
            .with_text("検索クエリを最適化する専門家", "search_query: 新サービス リリース BtoB");

        let chain = QueryGeneratorChain::new(Arc::new(gateway));
        let query = chain
            .run(QueryGenInput {
                input: StructuredInput {
                    theme: "新サービス".into(),
                    ..Default::default()
                },
                category: ArticleType::Announcement,
            })
            .await
            .unwrap();

        assert_eq!(query, "新サービス リリース BtoB");
    }
}
