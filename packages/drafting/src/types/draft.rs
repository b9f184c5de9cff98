//! The generated draft and its Markdown rendering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::article::ArticleType;
use super::outline::HeadingLevel;

/// Prefix of the unverified-claim marker. The full marker form is
/// `[要確認: <tag>]`.
pub const UNVERIFIED_TAG_PREFIX: &str = "[要確認:";

/// Format the full marker for a tag label.
pub fn unverified_marker(tag: &str) -> String {
    format!("[要確認: {tag}]")
}

/// A finished article section.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Section {
    #[serde(default)]
    pub level: HeadingLevel,
    pub heading: String,
    pub body: String,
}

/// The final artifact of a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,

    /// Exactly three candidate titles.
    pub titles: Vec<String>,

    /// Lead paragraph, 100-150 characters target.
    pub lead: String,

    pub sections: Vec<Section>,

    pub closing: String,

    pub category: ArticleType,

    pub theme: String,

    pub desired_length: i32,

    /// Recomputed on any mutation via [`Draft::recompute`].
    pub actual_length: i32,

    /// Occurrences of the unverified-claim marker across all text fields.
    pub tag_count: i32,

    /// Style consistency in [0, 1]. Zero when verification degraded.
    pub consistency_score: f32,

    /// Fact verification confidence in [0, 1]. Zero when degraded.
    pub verification_confidence: f32,
}

impl Draft {
    /// Character count of the generated body text.
    pub fn calculate_length(&self) -> i32 {
        let sections: usize = self.sections.iter().map(|s| s.body.chars().count()).sum();
        (self.lead.chars().count() + sections + self.closing.chars().count()) as i32
    }

    /// Occurrences of the unverified marker across every text field.
    pub fn count_tags(&self) -> i32 {
        let mut count = count_occurrences(&self.lead, UNVERIFIED_TAG_PREFIX)
            + count_occurrences(&self.closing, UNVERIFIED_TAG_PREFIX);
        for title in &self.titles {
            count += count_occurrences(title, UNVERIFIED_TAG_PREFIX);
        }
        for section in &self.sections {
            count += count_occurrences(&section.heading, UNVERIFIED_TAG_PREFIX);
            count += count_occurrences(&section.body, UNVERIFIED_TAG_PREFIX);
        }
        count
    }

    /// Refresh the derived `actual_length` and `tag_count` fields.
    pub fn recompute(&mut self) {
        self.actual_length = self.calculate_length();
        self.tag_count = self.count_tags();
    }

    /// Compose the draft as plain text for verification and rewriting:
    /// first title, lead, each section as a `## `/`### ` heading plus its
    /// body, then the closing.
    pub fn compose_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(title) = self.titles.first() {
            parts.push(title.clone());
        }
        parts.push(self.lead.clone());
        for section in &self.sections {
            parts.push(format!("{}{}", section.level.marker(), section.heading));
            parts.push(section.body.clone());
        }
        parts.push(self.closing.clone());
        parts.join("\n")
    }

    /// Render the deliverable Markdown: title options, lead, sections,
    /// closing, then the metadata footer.
    pub fn to_markdown(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push("## タイトル案（3つ）\n".to_string());
        for (i, title) in self.titles.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, title));
        }
        lines.push(String::new());

        lines.push("## リード文\n".to_string());
        lines.push(self.lead.clone());
        lines.push(String::new());

        lines.push("## 本文\n".to_string());
        for section in &self.sections {
            lines.push(format!("### {}\n", section.heading));
            lines.push(section.body.clone());
            lines.push(String::new());
        }

        lines.push("## 締め\n".to_string());
        lines.push(self.closing.clone());

        let mut markdown = lines.join("\n");
        markdown.push_str(&self.metadata_footer());
        markdown
    }

    /// The metadata footer appended to the rendered draft. Its format is
    /// part of the external contract.
    fn metadata_footer(&self) -> String {
        let consistency_pct = (self.consistency_score * 100.0).round() as i32;
        let confidence_pct = (self.verification_confidence * 100.0).round() as i32;

        format!(
            "\n\n---\n\n\
            ### メタ情報\n\
            - 記事カテゴリ: {category}\n\
            - テーマ: {theme}\n\
            - 総文字数: 約{actual}字（目標: {desired}字）\n\
            - [要確認]タグ: {tags}箇所\n\
            - 文体一貫性スコア: {consistency}%\n\
            - 事実検証信頼度: {confidence}%\n\
            \n\
            ### 次のステップ\n\
            1. [要確認] タグがある箇所は事実確認してください\n\
            2. タイトルは3案から選択または調整してください\n\
            3. 必要に応じて文章を微調整してください\n",
            category = self.category.label_ja(),
            theme = self.theme,
            actual = self.actual_length,
            desired = self.desired_length,
            tags = self.tag_count,
            consistency = consistency_pct,
            confidence = confidence_pct,
        )
    }
}

fn count_occurrences(haystack: &str, needle: &str) -> i32 {
    haystack.matches(needle).count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> Draft {
        Draft {
            id: Uuid::new_v4(),
            titles: vec!["案1".into(), "案2".into(), "案3".into()],
            lead: "リード文です。".into(),
            sections: vec![
                Section {
                    level: HeadingLevel::H2,
                    heading: "はじめに".into(),
                    body: "本文その1。".into(),
                },
                Section {
                    level: HeadingLevel::H3,
                    heading: "詳細".into(),
                    body: "本文その2。".into(),
                },
            ],
            closing: "締めの文章。".into(),
            category: ArticleType::Announcement,
            theme: "新サービス".into(),
            desired_length: 2000,
            actual_length: 0,
            tag_count: 0,
            consistency_score: 0.85,
            verification_confidence: 0.9,
        }
    }

    #[test]
    fn test_length_identity() {
        let mut draft = sample_draft();
        draft.recompute();

        let expected = draft.lead.chars().count()
            + draft
                .sections
                .iter()
                .map(|s| s.body.chars().count())
                .sum::<usize>()
            + draft.closing.chars().count();
        assert_eq!(draft.actual_length, expected as i32);
    }

    #[test]
    fn test_tag_count_matches_marker_occurrences() {
        let mut draft = sample_draft();
        draft.sections[0].body = format!("2019年に創業しました。{} 続き。", unverified_marker("創業年"));
        draft.closing = format!("締め。{}", unverified_marker("日付"));
        draft.recompute();
        assert_eq!(draft.tag_count, 2);
    }

    #[test]
    fn test_compose_text_skeleton() {
        let draft = sample_draft();
        let text = draft.compose_text();
        assert!(text.starts_with("案1\nリード文です。"));
        assert!(text.contains("\n## はじめに\n"));
        assert!(text.contains("\n### 詳細\n"));
        assert!(text.ends_with("締めの文章。"));
    }

    #[test]
    fn test_markdown_footer_contract() {
        let mut draft = sample_draft();
        draft.recompute();
        let md = draft.to_markdown();

        assert!(md.contains("### メタ情報"));
        assert!(md.contains("- 記事カテゴリ: アナウンスメント"));
        assert!(md.contains("- テーマ: 新サービス"));
        assert!(md.contains(&format!(
            "- 総文字数: 約{}字（目標: 2000字）",
            draft.actual_length
        )));
        assert!(md.contains("- [要確認]タグ: 0箇所"));
        assert!(md.contains("- 文体一貫性スコア: 85%"));
        assert!(md.contains("- 事実検証信頼度: 90%"));
        assert!(md.contains("### 次のステップ"));
        assert!(md.contains("1. [要確認] タグがある箇所は事実確認してください"));
    }

    #[test]
    fn test_markdown_orders_titles_first() {
        let draft = sample_draft();
        let md = draft.to_markdown();
        let titles_at = md.find("## タイトル案").unwrap();
        let lead_at = md.find("## リード文").unwrap();
        let body_at = md.find("## 本文").unwrap();
        let closing_at = md.find("## 締め").unwrap();
        assert!(titles_at < lead_at && lead_at < body_at && body_at < closing_at);
    }
}
