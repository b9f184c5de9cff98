//! The structured brief parsed from raw input material.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An interview remark usable as a direct quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InterviewQuote {
    /// 発言者の名前
    pub speaker: String,
    /// 引用可能な発言内容
    pub quote: String,
}

/// A person mentioned in the material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Person {
    /// 名前
    pub name: String,
    /// 役職・立場
    pub role: String,
}

/// Structured representation of the input material. Produced once by the
/// parser stage and immutable afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StructuredInput {
    /// 記事のテーマ・主旨（1文で要約）
    pub theme: String,

    /// 想定読者
    #[serde(default)]
    pub audience: String,

    /// 記事の目的
    #[serde(default)]
    pub goal: String,

    /// 希望文字数
    #[serde(default = "default_desired_length")]
    pub desired_length: i32,

    /// 記事に含めるべき重要ポイント
    #[serde(default)]
    pub key_points: Vec<String>,

    /// 引用可能なインタビュー発言
    #[serde(default)]
    pub interview_quotes: Vec<InterviewQuote>,

    /// 具体的な数値やデータ
    #[serde(default)]
    pub data_facts: Vec<String>,

    /// 登場人物
    #[serde(default)]
    pub people: Vec<Person>,

    /// 検索用キーワード（5-10個）
    #[serde(default)]
    pub keywords: Vec<String>,

    /// 記事作成に不足していそうな情報
    #[serde(default)]
    pub missing_info: Vec<String>,
}

fn default_desired_length() -> i32 {
    2000
}

impl StructuredInput {
    /// Interview quotes in「発言者: 「発言」」prompt form.
    pub fn quotes_line(&self) -> String {
        self.interview_quotes
            .iter()
            .map(|q| format!("{}: 「{}」", q.speaker, q.quote))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// People in「名前(役職)」prompt form.
    pub fn people_line(&self) -> String {
        self.people
            .iter()
            .map(|p| format!("{}({})", p.name, p.role))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_length_defaults_to_2000() {
        let parsed: StructuredInput =
            serde_json::from_str(r#"{"theme": "新サービスのリリース"}"#).unwrap();
        assert_eq!(parsed.desired_length, 2000);
        assert!(parsed.keywords.is_empty());
    }

    #[test]
    fn test_explicit_length_kept() {
        let parsed: StructuredInput =
            serde_json::from_str(r#"{"theme": "t", "desired_length": 1200}"#).unwrap();
        assert_eq!(parsed.desired_length, 1200);
    }

    #[test]
    fn test_prompt_lines() {
        let input = StructuredInput {
            theme: "入社エントリ".into(),
            interview_quotes: vec![InterviewQuote {
                speaker: "田中".into(),
                quote: "挑戦が多い環境です".into(),
            }],
            people: vec![Person {
                name: "田中".into(),
                role: "エンジニア".into(),
            }],
            ..Default::default()
        };
        assert_eq!(input.quotes_line(), "田中: 「挑戦が多い環境です」");
        assert_eq!(input.people_line(), "田中(エンジニア)");
    }
}
