//! SSE progress protocol: stages, percentages, and event envelopes.

use serde::Serialize;
use uuid::Uuid;

/// The nine pipeline stages, in execution order. Stage names and
/// percentages are part of the external SSE contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InputParse,
    Classify,
    QueryGen,
    Retrieve,
    Analyze,
    Outline,
    Contents,
    Quality,
    Assemble,
}

impl Stage {
    pub const ORDERED: [Stage; 9] = [
        Stage::InputParse,
        Stage::Classify,
        Stage::QueryGen,
        Stage::Retrieve,
        Stage::Analyze,
        Stage::Outline,
        Stage::Contents,
        Stage::Quality,
        Stage::Assemble,
    ];

    /// Wire name of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::InputParse => "input_parse",
            Stage::Classify => "classify",
            Stage::QueryGen => "query_gen",
            Stage::Retrieve => "retrieve",
            Stage::Analyze => "analyze",
            Stage::Outline => "outline",
            Stage::Contents => "contents",
            Stage::Quality => "quality",
            Stage::Assemble => "assemble",
        }
    }

    /// Fixed progress percentage reported when the stage starts.
    pub fn percentage(&self) -> u8 {
        match self {
            Stage::InputParse => 10,
            Stage::Classify => 20,
            Stage::QueryGen => 30,
            Stage::Retrieve => 45,
            Stage::Analyze => 55,
            Stage::Outline => 65,
            Stage::Contents => 85,
            Stage::Quality => 95,
            Stage::Assemble => 100,
        }
    }

    /// Human-readable label, used as the optional progress message.
    pub fn label_ja(&self) -> &'static str {
        match self {
            Stage::InputParse => "入力解析",
            Stage::Classify => "記事タイプ判定",
            Stage::QueryGen => "検索クエリ生成",
            Stage::Retrieve => "参考記事・スタイル検索",
            Stage::Analyze => "スタイル・構成分析",
            Stage::Outline => "アウトライン生成",
            Stage::Contents => "コンテンツ生成",
            Stage::Quality => "品質チェック",
            Stage::Assemble => "最終整形",
        }
    }
}

/// One event on the generation stream. Terminal events are `Complete`
/// and `Error`; the channel closes after either.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Progress {
        step: Stage,
        percentage: u8,
        message: String,
    },
    Complete {
        markdown: String,
        draft_id: Uuid,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl GenerationEvent {
    pub fn progress(step: Stage) -> Self {
        GenerationEvent::Progress {
            step,
            percentage: step.percentage(),
            message: step.label_ja().to_string(),
        }
    }

    /// SSE `event:` field value.
    pub fn event_name(&self) -> &'static str {
        match self {
            GenerationEvent::Progress { .. } => "progress",
            GenerationEvent::Complete { .. } => "complete",
            GenerationEvent::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Progress { .. })
    }

    /// SSE `data:` field JSON body.
    pub fn data(&self) -> serde_json::Value {
        match self {
            GenerationEvent::Progress {
                step,
                percentage,
                message,
            } => serde_json::json!({
                "step": step.as_str(),
                "percentage": percentage,
                "message": message,
            }),
            GenerationEvent::Complete { markdown, draft_id } => serde_json::json!({
                "markdown": markdown,
                "draft_id": draft_id,
            }),
            GenerationEvent::Error { kind, message } => serde_json::json!({
                "kind": kind,
                "message": message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentages_strictly_increase_in_order() {
        let mut last = 0;
        for stage in Stage::ORDERED {
            assert!(stage.percentage() > last, "{:?}", stage);
            last = stage.percentage();
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_contract_values() {
        assert_eq!(Stage::InputParse.as_str(), "input_parse");
        assert_eq!(Stage::InputParse.percentage(), 10);
        assert_eq!(Stage::Retrieve.percentage(), 45);
        assert_eq!(Stage::Contents.percentage(), 85);
        assert_eq!(Stage::Assemble.percentage(), 100);
    }

    #[test]
    fn test_progress_data_shape() {
        let event = GenerationEvent::progress(Stage::QueryGen);
        let data = event.data();
        assert_eq!(data["step"], "query_gen");
        assert_eq!(data["percentage"], 30);
        assert_eq!(event.event_name(), "progress");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        let complete = GenerationEvent::Complete {
            markdown: "# d".into(),
            draft_id: Uuid::nil(),
        };
        assert_eq!(complete.event_name(), "complete");
        assert!(complete.is_terminal());

        let error = GenerationEvent::Error {
            kind: "timeout".into(),
            message: "deadline".into(),
        };
        assert_eq!(error.event_name(), "error");
        assert_eq!(error.data()["kind"], "timeout");
    }
}
