//! Prompt templates for the generation chains.
//!
//! System prompts are static; user prompts are built by the `*_user`
//! helpers. Output shape is enforced through the structured-output schema,
//! not through in-prompt format instructions.

use crate::types::{Outline, OutlineSection, StructuredInput};

use super::analyzers::{StructureAnalysis, StyleAnalysis};

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

fn numbered(references: &[String]) -> String {
    references
        .iter()
        .enumerate()
        .map(|(i, r)| format!("### 記事{}\n{}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n\n")
}

// =============================================================================
// Input parser
// =============================================================================

pub const INPUT_PARSER_SYSTEM: &str = "あなたは入力素材を構造化するエキスパートです。

## タスク
ユーザーから提供された記事素材を分析し、構造化データに変換してください。

## 抽出項目
1. theme: 記事のテーマ・主旨（1文で要約）
2. audience: 想定読者（記載があれば）
3. goal: 記事の目的（記載があれば）
4. desired_length: 希望文字数（指定がなければ2000）
5. key_points: 記事に含めるべき重要ポイント（箇条書きから抽出）
6. interview_quotes: インタビュー内容（そのまま引用可能な発言）
7. data_facts: 具体的な数値やデータ
8. people: 登場人物（名前、役職）
9. keywords: 検索に使えるキーワード（5-10個）
10. missing_info: 記事作成に不足していそうな情報

## ルール
- 入力にない情報は推測しない
- 曖昧な表現はそのまま保持
- 数値や固有名詞は正確に抽出";

pub fn input_parser_user(input_material: &str) -> String {
    format!("## 入力素材\n{input_material}\n\n上記の素材を構造化してください。")
}

// =============================================================================
// Classifier
// =============================================================================

pub const CLASSIFIER_SYSTEM: &str = "あなたは記事タイプを分類する専門家です。

## タスク
構造化された素材から、作成すべき記事のタイプを判定してください。

## 記事タイプ（4種類）

1. ANNOUNCEMENT（アナウンスメント）
   - 新サービス、新機能のリリース告知
   - 会社からの重要なお知らせ
   - プレスリリース的な内容
   - キーワード: リリース、お知らせ、開始、発表、ローンチ

2. EVENT_REPORT（イベントレポート）
   - 社内勉強会の報告
   - 外部イベント参加レポート
   - ワークショップ、セミナーの振り返り
   - キーワード: 勉強会、イベント、セミナー、参加、開催、LT

3. INTERVIEW（インタビュー）
   - 社員インタビュー
   - 入社エントリ、退職エントリ
   - 特定の人物にフォーカスした記事
   - キーワード: インタビュー、入社、〇〇さん、働き方、キャリア

4. CULTURE（カルチャー）
   - 企業文化、価値観の紹介
   - 制度紹介（リモートワーク、福利厚生など）
   - チーム・組織の紹介
   - キーワード: 制度、文化、働き方、チーム、環境、福利厚生

## 判定ルール
- 迷った場合は素材の主目的で判定
- 複合的な場合は最も強い要素で判定";

pub fn classifier_user(input: &StructuredInput) -> String {
    format!(
        "## 素材情報\n\
         テーマ: {theme}\n\
         キーポイント: {key_points}\n\
         登場人物: {people}\n\
         キーワード: {keywords}\n\
         インタビュー引用: {quotes}\n\n\
         上記の素材から記事タイプを判定してください。",
        theme = input.theme,
        key_points = input.key_points.join(", "),
        people = input.people_line(),
        keywords = input.keywords.join(", "),
        quotes = input.quotes_line(),
    )
}

// =============================================================================
// Query generator
// =============================================================================

pub const QUERY_GEN_SYSTEM: &str = "あなたは検索クエリを最適化する専門家です。

## タスク
与えられた素材情報から、記事カテゴリの内容検索に最適な検索クエリを生成してください。

## クエリ生成ルール
- キーワード列挙形式で出力（スペース区切り）
- 各クエリは簡潔に（1-6単語）
- テーマに関連するクエリ（2-3個）
- 記事カテゴリの構成参考用クエリ（1-2個）

## カテゴリ別最適化
- INTERVIEW: 人物名、役職、キャリア、働き方
- EVENT_REPORT: イベント名、勉強会、学び、参加
- ANNOUNCEMENT: サービス名、リリース、新機能、お知らせ
- CULTURE: 制度名、文化、働き方、チーム

## 出力形式
キーワードのみをスペース区切りで出力してください。";

pub fn query_gen_user(input: &StructuredInput, category: &str) -> String {
    format!(
        "## 入力情報\n\
         - カテゴリ: {category}\n\
         - テーマ: {theme}\n\
         - 読者: {audience}\n\
         - 目的: {goal}\n\
         - キーワード: {keywords}\n\n\
         検索クエリを生成してください。",
        theme = input.theme,
        audience = if input.audience.is_empty() {
            "転職を検討しているエンジニア"
        } else {
            input.audience.as_str()
        },
        goal = if input.goal.is_empty() {
            "採用広報、企業文化の紹介"
        } else {
            input.goal.as_str()
        },
        keywords = join_or(&input.keywords, "なし"),
    )
}

// =============================================================================
// Style / structure analyzers
// =============================================================================

pub const STYLE_ANALYZER_SYSTEM: &str = "あなたは文章スタイルを分析する専門家です。

## タスク
過去記事から、採用広報note記事の文体特徴を抽出してください。

## 分析項目
1. sentence_endings: よく使われる語尾パターン（例: 「〜ですね」「〜なんです」）
2. tone: 全体的なトーン（カジュアル/フォーマル/その中間）
3. first_person: 使われている一人称（私/僕/筆者など）
4. reader_address: 読者への呼びかけ方
5. paragraph_style: 段落の長さや区切り方の傾向
6. emoji_usage: 絵文字の使用有無と頻度
7. characteristic_phrases: 特徴的なフレーズや言い回し（5-10個）

## ルール
- 具体例を挙げて説明
- 記事タイプに特有のスタイルがあれば明記
- 複数の記事に共通するパターンを優先";

pub fn style_analyzer_user(references: &[String], article_type_ja: &str) -> String {
    format!(
        "## 記事タイプ\n{article_type_ja}\n\n## 過去記事\n{refs}\n\n\
         上記の過去記事から文体特徴を抽出してください。",
        refs = numbered(references),
    )
}

pub const STRUCTURE_ANALYZER_SYSTEM: &str = "あなたは記事構成を分析する専門家です。

## タスク
過去記事から、記事の構成パターンを分析してください。

## 分析項目
1. typical_headings: よく使われる見出しパターン
2. intro_pattern: リード文の書き方パターン
3. section_flow: セクションの流れ（導入→展開→まとめ等）
4. closing_pattern: 締めの文章パターン

## 記事タイプ別の特徴
- アナウンスメント: 結論先行、簡潔、リンク誘導
- イベントレポート: 時系列、参加者の声、学び
- インタビュー: Q&A形式、人物描写、ストーリー
- カルチャー: 制度説明、具体例、メリット";

pub fn structure_analyzer_user(references: &[String], article_type_ja: &str) -> String {
    format!(
        "## 今回の記事タイプ\n{article_type_ja}\n\n## 過去記事\n{refs}\n\n\
         上記から構成パターンを分析してください。",
        refs = numbered(references),
    )
}

// =============================================================================
// Outline
// =============================================================================

pub const OUTLINE_SYSTEM: &str = "あなたは記事構成の専門家です。

## タスク
与えられた情報をもとに、記事のアウトライン（骨子）を作成してください。

## 記事タイプ別ガイドライン
- アナウンスメント: 概要→詳細→今後の展開→CTA
- イベントレポート: 導入→イベント概要→学び・気づき→まとめ
- インタビュー: 人物紹介→きっかけ→現在の仕事→今後の展望
- カルチャー: 制度紹介→具体的な運用→社員の声→まとめ

## 制約
- 見出しは2〜4個、レベルはH2またはH3
- 各見出しに、その下に書く内容の概要と利用する素材を記載
- 希望文字数に合わせて各セクションの目標文字数を配分";

pub fn outline_user(
    input: &StructuredInput,
    article_type_ja: &str,
    style: &StyleAnalysis,
    structure: &StructureAnalysis,
    style_profile: &str,
    excerpts: &[String],
    references: &[String],
) -> String {
    format!(
        "## 記事情報\n\
         テーマ: {theme}\n\
         記事タイプ: {article_type_ja}\n\
         希望文字数: {desired}字\n\
         キーポイント: {key_points}\n\
         インタビュー引用: {quotes}\n\n\
         ## 構成パターン（過去記事分析結果）\n\
         典型的な見出し: {headings}\n\
         セクションの流れ: {flow}\n\n\
         ## 文体ガイド\n\
         トーン: {tone}\n\
         語尾パターン: {endings}\n\n\
         ## 文体ルール\n{profile}\n\n\
         ## 文体サンプル\n{excerpts}\n\n\
         ## 参考記事\n{refs}\n\n\
         アウトラインを作成してください。",
        theme = input.theme,
        desired = input.desired_length,
        key_points = input.key_points.join(", "),
        quotes = input.quotes_line(),
        headings = structure.typical_headings.join(", "),
        flow = structure.section_flow,
        tone = style.tone,
        endings = style.sentence_endings.join(", "),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
        excerpts = join_or(excerpts, "なし"),
        refs = numbered(references),
    )
}

// =============================================================================
// Content generators
// =============================================================================

pub const TITLE_SYSTEM: &str = "あなたはnote記事のタイトルを考える専門家です。

## タスク
与えられた情報をもとに、魅力的なタイトル案をちょうど3つ作成してください。

## 記事タイプ別タイトル傾向
- アナウンスメント: 「〇〇をリリースしました」「〇〇のお知らせ」
- イベントレポート: 「〇〇勉強会レポート」「〇〇に参加してきました」
- インタビュー: 「〇〇さんに聞いてみた」「入社N年目の本音」
- カルチャー: 「〇〇制度を紹介」「こんな働き方しています」

## タイトル作成のポイント
- ターゲット読者: 転職を検討しているエンジニア
- 目的: 採用広報、企業文化の紹介
- クリックしたくなる魅力的な表現
- 30文字前後を目安";

pub fn title_user(input: &StructuredInput, article_type_ja: &str, outline: &Outline, style_profile: &str) -> String {
    format!(
        "## 記事情報\n\
         テーマ: {theme}\n\
         記事タイプ: {article_type_ja}\n\
         アウトライン: {outline}\n\n\
         ## 文体ルール\n{profile}\n\n\
         タイトル案を3つ作成してください。",
        theme = input.theme,
        outline = outline.titles_line(),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
    )
}

pub const LEAD_SYSTEM: &str = "あなたは採用広報のnote記事ライターです。

## タスク
記事の冒頭を飾るリード文を作成してください。

## 制約
- 100〜150字
- 記事を読みたくなる魅力的な書き出し
- 文体ガイドに従う
- ターゲット読者（転職検討中のエンジニア）を意識
- リード文のみを出力する";

pub fn lead_user(
    input: &StructuredInput,
    article_type_ja: &str,
    outline: &Outline,
    style: &StyleAnalysis,
    structure: &StructureAnalysis,
    style_profile: &str,
    excerpts: &[String],
) -> String {
    format!(
        "## 記事情報\n\
         テーマ: {theme}\n\
         記事タイプ: {article_type_ja}\n\
         アウトライン: {outline}\n\n\
         ## 文体ガイド\n\
         トーン: {tone}\n\
         語尾パターン: {endings}\n\
         特徴的フレーズ: {phrases}\n\n\
         ## 文体ルール\n{profile}\n\n\
         ## 文体サンプル\n{excerpts}\n\n\
         ## 過去記事のリード文パターン\n{intro}\n\n\
         リード文を作成してください。",
        theme = input.theme,
        outline = outline.titles_line(),
        tone = style.tone,
        endings = style.sentence_endings.join(", "),
        phrases = style.characteristic_phrases.join(", "),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
        excerpts = join_or(excerpts, "なし"),
        intro = structure.intro_pattern,
    )
}

pub const SECTION_SYSTEM: &str = "あなたは採用広報のnote記事ライターです。

## タスク
指定された見出しの本文を執筆してください。

## 絶対ルール
1. 参考資料・入力素材に含まれない具体的な数値・固有名詞は補完しない
2. 不明な情報は [要確認: 〇〇] と記載
3. インタビュー引用は「」で括って使用
4. 文体ガイドの語尾パターンを使用
5. 事実と異なる情報を創作しない

## 出力
見出しの本文のみを出力（見出し自体は含めない）";

pub fn section_user(
    section: &OutlineSection,
    input: &StructuredInput,
    article_type_ja: &str,
    style: &StyleAnalysis,
    style_profile: &str,
    passages: &[String],
) -> String {
    format!(
        "## 見出し情報\n\
         見出し: {title}\n\
         概要: {summary}\n\
         含めるべき情報: {key_sources}\n\
         目標文字数: {target}字\n\n\
         ## 記事タイプ\n{article_type_ja}\n\n\
         ## 入力素材\n\
         テーマ: {theme}\n\
         キーポイント: {key_points}\n\
         インタビュー引用: {quotes}\n\
         データ・数値: {facts}\n\
         登場人物: {people}\n\n\
         ## 参考資料（この範囲の事実のみ使用）\n{refs}\n\n\
         ## 文体ガイド（必ず従うこと）\n\
         トーン: {tone}\n\
         語尾パターン: {endings}\n\
         一人称: {first_person}\n\
         読者への呼びかけ: {address}\n\
         特徴的フレーズ: {phrases}\n\n\
         ## 文体ルール\n{profile}\n\n\
         この見出しの本文を執筆してください。",
        title = section.title,
        summary = section.summary,
        key_sources = section.key_sources.join(", "),
        target = section.target_length,
        theme = input.theme,
        key_points = input.key_points.join(", "),
        quotes = input.quotes_line(),
        facts = input.data_facts.join(", "),
        people = input.people_line(),
        refs = numbered(passages),
        tone = style.tone,
        endings = style.sentence_endings.join(", "),
        first_person = style.first_person,
        address = style.reader_address,
        phrases = style.characteristic_phrases.join(", "),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
    )
}

pub const CLOSING_SYSTEM: &str = "あなたは採用広報のnote記事ライターです。

## タスク
記事の締めの文章を作成してください。

## 記事タイプ別締め方
- アナウンスメント: サービスへの誘導、今後の展開
- イベントレポート: 次回予告、参加募集
- インタビュー: 応募への誘導、SNSフォロー促進
- カルチャー: 採用サイトへの誘導、問い合わせ案内

## 制約
- 3〜5文程度
- 読後感の良い締めくくり
- 適切なCTA（Call To Action）を含める
- 文体ガイドに従う
- 締めの文章のみを出力する";

pub fn closing_user(
    input: &StructuredInput,
    article_type_ja: &str,
    outline: &Outline,
    style: &StyleAnalysis,
    structure: &StructureAnalysis,
    style_profile: &str,
) -> String {
    format!(
        "## 記事情報\n\
         テーマ: {theme}\n\
         記事タイプ: {article_type_ja}\n\
         アウトライン: {outline}\n\n\
         ## 文体ガイド\n\
         トーン: {tone}\n\
         語尾パターン: {endings}\n\n\
         ## 文体ルール\n{profile}\n\n\
         ## 過去記事の締めパターン\n{closing}\n\n\
         締めの文章を作成してください。",
        theme = input.theme,
        outline = outline.titles_line(),
        tone = style.tone,
        endings = style.sentence_endings.join(", "),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
        closing = structure.closing_pattern,
    )
}

// =============================================================================
// Verification
// =============================================================================

pub const STYLE_CHECK_SYSTEM: &str = "あなたは文体の一貫性を検証する専門家です。

## タスク
生成された記事が文体ガイドに従っているか検証してください。

## 検証項目
1. 語尾パターンの使用率
2. トーンの一貫性
3. 一人称の統一
4. 特徴的フレーズの使用
5. 不自然な表現

各問題点には severity（low/medium/high）を付けてください。";

pub fn style_check_user(draft_text: &str, style: &StyleAnalysis, style_profile: &str) -> String {
    format!(
        "## 文体ガイド\n\
         語尾パターン: {endings}\n\
         トーン: {tone}\n\
         一人称: {first_person}\n\
         特徴的フレーズ: {phrases}\n\n\
         ## 文体ルール\n{profile}\n\n\
         ## 生成された記事\n{draft_text}\n\n\
         文体の一貫性を検証してください。",
        endings = style.sentence_endings.join(", "),
        tone = style.tone,
        first_person = style.first_person,
        phrases = style.characteristic_phrases.join(", "),
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
    )
}

pub const REWRITE_SYSTEM: &str = "あなたはスタイル編集者です。
文体ルールを満たすように本文を完全リライトしてください。

## 指示
1. 文体ルールに一致するよう文体を整える
2. 文体チェック結果の修正案を反映
3. 内容・事実は変更しない
4. 構成（## / ### の見出しと順序）は維持
5. 語尾パターン、トーン、一人称を統一";

pub fn rewrite_user(
    article_text: &str,
    consistency_score: f32,
    issues: &str,
    corrections: &str,
    style_profile: &str,
) -> String {
    format!(
        "## 文体ルール\n{profile}\n\n\
         ## 文体チェック結果\n\
         一貫性スコア: {score:.0}%\n\
         問題点:\n{issues}\n\
         修正案:\n{corrections}\n\n\
         ## 元の記事\n{article_text}\n\n\
         上記の記事を文体ルールに従ってリライトしてください。",
        profile = if style_profile.is_empty() { "なし" } else { style_profile },
        score = consistency_score * 100.0,
    )
}

pub const HALLUCINATION_SYSTEM: &str = "あなたは事実確認の専門家です。

## タスク
生成された記事に、根拠資料にない情報（ハルシネーション）が含まれていないか検証してください。

## 検証ルール
1. 記事内の具体的な事実（数値、日付、固有名詞、発言）を抽出
2. 各事実が根拠資料（入力素材・参考記事）に存在するか照合
3. 存在しない事実を「要確認候補」としてマーク
4. 一般的な表現（感想、形容詞など）は許容

## 重点チェック項目
- 数値（年数、金額、人数など）
- 固有名詞（製品名、サービス名、人名など）
- 具体的な日付・期間
- インタビュー発言（「」内）

各要確認候補には、claim（記事中の文そのまま）、reason、suggested_tag（短いラベル）を付けてください。";

pub fn hallucination_user(
    draft_text: &str,
    input: &StructuredInput,
    passages: &[String],
) -> String {
    format!(
        "## 根拠資料（入力素材）\n\
         テーマ: {theme}\n\
         キーポイント: {key_points}\n\
         インタビュー引用: {quotes}\n\
         データ・数値: {facts}\n\
         登場人物: {people}\n\n\
         ## 根拠資料（参考記事）\n{refs}\n\n\
         ## 生成された記事\n{draft_text}\n\n\
         ハルシネーションを検出してください。",
        theme = input.theme,
        key_points = input.key_points.join(", "),
        quotes = input.quotes_line(),
        facts = input.data_facts.join(", "),
        people = input.people_line(),
        refs = numbered(passages),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_user_includes_material() {
        let input = StructuredInput {
            theme: "新サービスのリリース".into(),
            keywords: vec!["リリース".into(), "BtoB".into()],
            ..Default::default()
        };
        let prompt = classifier_user(&input);
        assert!(prompt.contains("新サービスのリリース"));
        assert!(prompt.contains("リリース, BtoB"));
    }

    #[test]
    fn test_query_gen_user_falls_back_to_defaults() {
        let input = StructuredInput {
            theme: "t".into(),
            ..Default::default()
        };
        let prompt = query_gen_user(&input, "CULTURE");
        assert!(prompt.contains("転職を検討しているエンジニア"));
        assert!(prompt.contains("キーワード: なし"));
    }

    #[test]
    fn test_numbered_references() {
        let refs = vec!["一つ目".to_string(), "二つ目".to_string()];
        let joined = numbered(&refs);
        assert!(joined.contains("### 記事1\n一つ目"));
        assert!(joined.contains("### 記事2\n二つ目"));
    }
}
