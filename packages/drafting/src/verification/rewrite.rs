//! Auto-rewrite chain and the deterministic skeleton re-parse.
//!
//! The rewriter receives the composed draft text and must preserve facts
//! and the `## `/`### ` heading skeleton. Its output is re-parsed back
//! into lead, sections, and closing; a rewrite that changes the skeleton
//! is discarded.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chains::{invoke_structured, prompts, Chain};
use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{Draft, HeadingLevel, Section};

use super::style_check::StyleCheckResult;

/// Result of an automatic rewrite.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RewriteResult {
    /// リライト後の記事テキスト
    pub rewritten_text: String,

    /// 実施した変更点のリスト
    #[serde(default)]
    pub changes_made: Vec<String>,
}

/// Input for the rewrite chain.
pub struct RewriteInput {
    pub article_text: String,
    pub check: StyleCheckResult,
    pub style_profile: String,
}

/// Rewrites the draft to match the style rulebook.
pub struct AutoRewriteChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl AutoRewriteChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for AutoRewriteChain {
    type Input = RewriteInput;
    type Output = RewriteResult;

    async fn run(&self, input: RewriteInput) -> Result<RewriteResult> {
        let issues = input
            .check
            .issues
            .iter()
            .map(|i| format!("- {}: {}", i.location, i.description))
            .collect::<Vec<_>>()
            .join("\n");
        let corrections = input
            .check
            .corrected_sections
            .iter()
            .map(|c| format!("- {} → {}", c.original, c.corrected))
            .collect::<Vec<_>>()
            .join("\n");

        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::High,
            0.5,
            prompts::REWRITE_SYSTEM,
            &prompts::rewrite_user(
                &input.article_text,
                input.check.consistency_score,
                if issues.is_empty() { "なし" } else { issues.as_str() },
                if corrections.is_empty() { "なし" } else { corrections.as_str() },
                &input.style_profile,
            ),
        )
        .await
    }
}

/// The parsed skeleton of a rewritten draft.
#[derive(Debug)]
struct Skeleton {
    lead: String,
    sections: Vec<Section>,
}

/// Parse the rewritten composed text: the first line is the title, the
/// text up to the first heading is the lead, and each `## `/`### ` line
/// starts a section whose body runs to the next heading.
fn parse_skeleton(text: &str) -> Skeleton {
    let mut lead_lines: Vec<&str> = Vec::new();
    let mut sections: Vec<Section> = Vec::new();
    let mut saw_title = false;

    for line in text.lines() {
        let heading = if let Some(title) = line.strip_prefix("### ") {
            Some((HeadingLevel::H3, title))
        } else {
            line.strip_prefix("## ").map(|title| (HeadingLevel::H2, title))
        };

        match heading {
            Some((level, title)) => {
                sections.push(Section {
                    level,
                    heading: title.trim().to_string(),
                    body: String::new(),
                });
            }
            None => match sections.last_mut() {
                Some(section) => {
                    if !section.body.is_empty() {
                        section.body.push('\n');
                    }
                    section.body.push_str(line);
                }
                None => {
                    // First non-heading line is the rewritten title; it is
                    // discarded because the original title list is kept.
                    if !saw_title && !line.trim().is_empty() {
                        saw_title = true;
                        continue;
                    }
                    lead_lines.push(line);
                }
            },
        }
    }

    for section in &mut sections {
        section.body = section.body.trim().to_string();
    }

    Skeleton {
        lead: lead_lines.join("\n").trim().to_string(),
        sections,
    }
}

/// Fold a rewrite back into the draft.
///
/// The original titles are always kept. The rewritten text must contain
/// the same number of headed blocks as the draft has sections — plus
/// optionally one more, which replaces the closing. Any other shape means
/// the rewriter broke the skeleton; the draft is left untouched.
pub fn apply_rewrite(draft: &mut Draft, rewritten_text: &str) -> bool {
    let skeleton = parse_skeleton(rewritten_text);
    let expected = draft.sections.len();

    if skeleton.lead.is_empty() || skeleton.sections.len() < expected {
        warn!(
            expected_sections = expected,
            parsed_sections = skeleton.sections.len(),
            "rewrite broke the heading skeleton, keeping original draft"
        );
        return false;
    }

    match skeleton.sections.len() - expected {
        0 => {
            draft.lead = skeleton.lead;
            draft.sections = skeleton.sections;
        }
        1 => {
            let mut sections = skeleton.sections;
            let closing = sections.pop().map(|s| s.body).unwrap_or_default();
            draft.lead = skeleton.lead;
            draft.sections = sections;
            if !closing.is_empty() {
                draft.closing = closing;
            }
        }
        _ => {
            warn!(
                expected_sections = expected,
                parsed_sections = skeleton.sections.len(),
                "rewrite broke the heading skeleton, keeping original draft"
            );
            return false;
        }
    }

    draft.recompute();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArticleType;
    use uuid::Uuid;

    fn draft() -> Draft {
        Draft {
            id: Uuid::new_v4(),
            titles: vec!["元の案1".into(), "元の案2".into(), "元の案3".into()],
            lead: "元のリード。".into(),
            sections: vec![
                Section {
                    level: HeadingLevel::H2,
                    heading: "はじめに".into(),
                    body: "元の本文1。".into(),
                },
                Section {
                    level: HeadingLevel::H2,
                    heading: "本題".into(),
                    body: "元の本文2。".into(),
                },
            ],
            closing: "元の締め。".into(),
            category: ArticleType::Culture,
            theme: "テーマ".into(),
            desired_length: 2000,
            actual_length: 0,
            tag_count: 0,
            consistency_score: 0.7,
            verification_confidence: 0.0,
        }
    }

    #[test]
    fn test_rewrite_replaces_lead_and_sections() {
        let mut d = draft();
        let rewritten = "新タイトル\n新しいリードです。\n## はじめに\n新しい本文1です。\n## 本題\n新しい本文2です。";

        assert!(apply_rewrite(&mut d, rewritten));
        assert_eq!(d.lead, "新しいリードです。");
        assert_eq!(d.sections[0].body, "新しい本文1です。");
        assert_eq!(d.sections[1].body, "新しい本文2です。");
        // Titles and closing are preserved.
        assert_eq!(d.titles[0], "元の案1");
        assert_eq!(d.closing, "元の締め。");
    }

    #[test]
    fn test_extra_trailing_block_replaces_closing() {
        let mut d = draft();
        let rewritten = "新タイトル\n新リード。\n## はじめに\n本文1。\n## 本題\n本文2。\n## おわりに\n新しい締めです。";

        assert!(apply_rewrite(&mut d, rewritten));
        assert_eq!(d.sections.len(), 2);
        assert_eq!(d.closing, "新しい締めです。");
    }

    #[test]
    fn test_broken_skeleton_keeps_original() {
        let mut d = draft();
        let before = d.sections.clone();

        // Rewriter merged the two sections into one.
        assert!(!apply_rewrite(&mut d, "タイトル\nリード。\n## 全部まとめ\n本文。"));
        assert_eq!(d.sections.len(), before.len());
        assert_eq!(d.lead, "元のリード。");
    }

    #[test]
    fn test_h3_levels_preserved() {
        let mut d = draft();
        d.sections[1].level = HeadingLevel::H3;
        let rewritten = "タイトル\nリード。\n## はじめに\n本文1。\n### 本題\n本文2。";

        assert!(apply_rewrite(&mut d, rewritten));
        assert_eq!(d.sections[1].level, HeadingLevel::H3);
    }
}
