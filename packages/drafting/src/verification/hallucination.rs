//! Hallucination detection and unverified-claim tagging.
//!
//! The tagger appends `[要確認: <tag>]` after the sentence containing a
//! claim. Sentence boundaries are the Japanese full stop `。`, a newline,
//! or an English period followed by whitespace. Tagging is idempotent per
//! claim occurrence.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::chains::{invoke_structured, prompts, Chain};
use crate::error::Result;
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::types::{unverified_marker, StructuredInput};

/// A claim the detector could not ground in the source material.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnverifiedClaim {
    /// 根拠資料で確認できなかった主張（記事中の文そのまま）
    pub claim: String,

    /// 確認できなかった理由
    #[serde(default)]
    pub reason: String,

    /// [要確認]タグに付けるラベル
    pub suggested_tag: String,
}

/// Result of hallucination detection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HallucinationCheckResult {
    /// ハルシネーションがあるか
    pub has_hallucination: bool,

    /// 検証の信頼度（0-1）
    pub confidence: f32,

    /// 根拠資料で確認できた事実
    #[serde(default)]
    pub verified_facts: Vec<String>,

    /// 根拠資料で確認できなかった主張
    #[serde(default)]
    pub unverified_claims: Vec<UnverifiedClaim>,
}

impl HallucinationCheckResult {
    /// The degraded result used when verification fails transiently.
    pub fn degraded() -> Self {
        Self {
            has_hallucination: false,
            confidence: 0.0,
            verified_facts: Vec::new(),
            unverified_claims: Vec::new(),
        }
    }
}

/// Input for hallucination detection.
pub struct HallucinationInput {
    pub draft_text: String,
    pub input: StructuredInput,
    pub passages: Vec<String>,
}

/// Detects claims unsupported by the input material and passages.
pub struct HallucinationDetectorChain {
    gateway: Arc<dyn LanguageGateway>,
}

impl HallucinationDetectorChain {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Chain for HallucinationDetectorChain {
    type Input = HallucinationInput;
    type Output = HallucinationCheckResult;

    async fn run(&self, input: HallucinationInput) -> Result<HallucinationCheckResult> {
        invoke_structured(
            self.gateway.as_ref(),
            ModelTier::Lite,
            0.0,
            prompts::HALLUCINATION_SYSTEM,
            &prompts::hallucination_user(&input.draft_text, &input.input, &input.passages),
        )
        .await
    }
}

/// Insert the unverified marker after every occurrence of each claim's
/// sentence. Occurrences already carrying the marker are left alone, so
/// applying the tagger twice changes nothing.
pub fn apply_tags(text: &str, claims: &[UnverifiedClaim]) -> String {
    let mut result = text.to_string();
    for claim in claims {
        if claim.claim.is_empty() {
            continue;
        }
        result = tag_claim(&result, &claim.claim, &claim.suggested_tag);
    }
    result
}

fn tag_claim(text: &str, claim: &str, tag: &str) -> String {
    let marker = unverified_marker(tag);
    let mut result = String::with_capacity(text.len() + marker.len());
    let mut rest = text;

    loop {
        match rest.find(claim) {
            None => {
                result.push_str(rest);
                return result;
            }
            Some(at) => {
                let claim_end = at + claim.len();
                let boundary = sentence_end(rest, claim_end);

                // Already tagged either inside the sentence tail (newline
                // boundaries keep the marker before the break) or right
                // after it (full-stop boundaries).
                let already_tagged = rest[claim_end..boundary].contains(&marker)
                    || rest[boundary..].starts_with(&marker);

                result.push_str(&rest[..boundary]);
                if !already_tagged {
                    result.push_str(&marker);
                }
                rest = &rest[boundary..];
            }
        }
    }
}

/// Byte offset just past the end of the sentence containing `from`.
///
/// The sentence ends at the first `。` (inclusive), at a `.` followed by
/// whitespace (inclusive of the period), or just before a newline. With no
/// boundary, the sentence runs to the end of the text.
fn sentence_end(text: &str, from: usize) -> usize {
    let tail = &text[from..];
    let mut chars = tail.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '。' => return from + i + c.len_utf8(),
            '\n' => return from + i,
            '.' => {
                if let Some((_, next)) = chars.peek() {
                    if next.is_whitespace() {
                        return from + i + 1;
                    }
                } else {
                    return from + i + 1;
                }
            }
            _ => {}
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(text: &str, tag: &str) -> UnverifiedClaim {
        UnverifiedClaim {
            claim: text.into(),
            reason: String::new(),
            suggested_tag: tag.into(),
        }
    }

    #[test]
    fn test_tag_inserted_after_sentence() {
        let text = "2019年に創業しました。現在は50名の組織です。";
        let tagged = apply_tags(text, &[claim("2019年に創業しました", "創業年")]);
        assert_eq!(
            tagged,
            "2019年に創業しました。[要確認: 創業年]現在は50名の組織です。"
        );
    }

    #[test]
    fn test_tagging_is_idempotent() {
        let text = "2019年に創業しました。続き。";
        let claims = [claim("2019年に創業しました", "創業年")];
        let once = apply_tags(text, &claims);
        let twice = apply_tags(&once, &claims);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_tagging_is_idempotent_at_newline_boundary() {
        let text = "売上は3倍になりました\n次の行です。";
        let claims = [claim("売上は3倍になりました", "売上")];
        let once = apply_tags(text, &claims);
        let twice = apply_tags(&once, &claims);
        assert_eq!(once, twice);
        assert_eq!(once.matches("[要確認: 売上]").count(), 1);
    }

    #[test]
    fn test_every_occurrence_tagged() {
        let text = "創業は2019年です。別の段落でも創業は2019年です。";
        let tagged = apply_tags(text, &[claim("創業は2019年です", "創業年")]);
        assert_eq!(tagged.matches("[要確認: 創業年]").count(), 2);
    }

    #[test]
    fn test_newline_boundary() {
        let text = "売上は3倍になりました\n次の行です。";
        let tagged = apply_tags(text, &[claim("売上は3倍になりました", "売上")]);
        assert_eq!(tagged, "売上は3倍になりました[要確認: 売上]\n次の行です。");
    }

    #[test]
    fn test_english_period_boundary() {
        let text = "Launched in March 2025. Next sentence.";
        let tagged = apply_tags(text, &[claim("Launched in March 2025", "launch date")]);
        assert_eq!(
            tagged,
            "Launched in March 2025.[要確認: launch date] Next sentence."
        );
    }

    #[test]
    fn test_missing_claim_leaves_text_unchanged() {
        let text = "本文です。";
        let tagged = apply_tags(text, &[claim("存在しない主張", "謎")]);
        assert_eq!(tagged, text);
    }

    #[test]
    fn test_no_boundary_appends_at_end() {
        let text = "締めの一文（句点なし）";
        let tagged = apply_tags(text, &[claim("締めの一文（句点なし）", "締め")]);
        assert_eq!(tagged, "締めの一文（句点なし）[要確認: 締め]");
    }
}
