//! Article outline produced by the outline chain.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Heading depth of an outline section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum HeadingLevel {
    H2,
    H3,
}

impl HeadingLevel {
    /// Markdown heading marker, including the trailing space.
    pub fn marker(&self) -> &'static str {
        match self {
            HeadingLevel::H2 => "## ",
            HeadingLevel::H3 => "### ",
        }
    }
}

impl Default for HeadingLevel {
    fn default() -> Self {
        HeadingLevel::H2
    }
}

/// One planned section of the article.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OutlineSection {
    /// 見出しレベル
    #[serde(default)]
    pub level: HeadingLevel,

    /// 見出しテキスト
    pub title: String,

    /// このセクションで書く内容の概要
    pub summary: String,

    /// 含めるべき素材からの情報
    #[serde(default)]
    pub key_sources: Vec<String>,

    /// 目標文字数
    #[serde(default = "default_section_length")]
    pub target_length: i32,
}

fn default_section_length() -> i32 {
    300
}

/// Complete article outline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Outline {
    /// 見出し構成（2-4個）
    pub sections: Vec<OutlineSection>,

    /// 本文全体の目標文字数
    #[serde(default = "default_total_length")]
    pub total_target_length: i32,
}

fn default_total_length() -> i32 {
    1500
}

impl Outline {
    /// Section titles joined for prompt context.
    pub fn titles_line(&self) -> String {
        self.sections
            .iter()
            .map(|s| s.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_on_parse() {
        let outline: Outline = serde_json::from_str(
            r#"{"sections": [{"title": "はじめに", "summary": "導入"}]}"#,
        )
        .unwrap();
        assert_eq!(outline.sections[0].level, HeadingLevel::H2);
        assert_eq!(outline.sections[0].target_length, 300);
        assert_eq!(outline.total_target_length, 1500);
    }

    #[test]
    fn test_markers() {
        assert_eq!(HeadingLevel::H2.marker(), "## ");
        assert_eq!(HeadingLevel::H3.marker(), "### ");
    }
}
