//! Testing utilities: mock gateway and reranker.
//!
//! Useful for exercising the pipeline without real model or network
//! calls. Responses are scripted against prompt markers; embeddings are
//! deterministic functions of the input text.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DraftingError, Result};
use crate::traits::ai::{LanguageGateway, ModelTier};
use crate::traits::rerank::Reranker;

/// Record of one gateway call, for assertions.
#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub tier: ModelTier,
    pub system: String,
    pub user: String,
}

/// A scripted gateway.
///
/// Responses are registered against a marker string; a call matches when
/// its system or user prompt contains the marker. Failures are checked
/// before responses; the most recently registered matching response wins,
/// so tests can re-script a marker over a shared baseline.
pub struct MockGateway {
    json_responses: Mutex<Vec<(String, serde_json::Value)>>,
    text_responses: Mutex<Vec<(String, String)>>,
    failures: Mutex<Vec<String>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<GatewayCall>>,
    embedding_dim: usize,
}

impl MockGateway {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            json_responses: Mutex::new(Vec::new()),
            text_responses: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            delays: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            embedding_dim,
        }
    }

    /// Script a structured response for prompts containing `marker`.
    pub fn with_json(self, marker: impl Into<String>, value: serde_json::Value) -> Self {
        self.json_responses.lock().unwrap().push((marker.into(), value));
        self
    }

    /// Script a text response for prompts containing `marker`.
    pub fn with_text(self, marker: impl Into<String>, text: impl Into<String>) -> Self {
        self.text_responses.lock().unwrap().push((marker.into(), text.into()));
        self
    }

    /// Make prompts containing `marker` fail with an upstream error.
    pub fn with_failure(self, marker: impl Into<String>) -> Self {
        self.failures.lock().unwrap().push(marker.into());
        self
    }

    /// Delay responses to prompts containing `marker`, for cancellation
    /// and timeout tests.
    pub fn with_delay(self, marker: impl Into<String>, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((marker.into(), delay));
        self
    }

    /// Deterministic embedding for a text.
    pub fn embedding_for(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.embedding_dim];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.embedding_dim] += byte as f32 / 255.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }

    /// All recorded calls.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Tier of the most recent chat call.
    pub fn tier_of_last_call(&self) -> Option<ModelTier> {
        self.calls.lock().unwrap().last().map(|c| c.tier)
    }

    /// Number of chat calls whose prompts contain `marker`.
    pub fn calls_matching(&self, marker: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.system.contains(marker) || c.user.contains(marker))
            .count()
    }

    fn record(&self, tier: ModelTier, system: &str, user: &str) {
        self.calls.lock().unwrap().push(GatewayCall {
            tier,
            system: system.to_string(),
            user: user.to_string(),
        });
    }

    async fn apply_delay(&self, system: &str, user: &str) {
        let delay = {
            let delays = self.delays.lock().unwrap();
            delays
                .iter()
                .find(|(m, _)| system.contains(m.as_str()) || user.contains(m.as_str()))
                .map(|(_, d)| *d)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_failure(&self, system: &str, user: &str) -> Result<()> {
        let failures = self.failures.lock().unwrap();
        if let Some(marker) = failures
            .iter()
            .find(|m| system.contains(m.as_str()) || user.contains(m.as_str()))
        {
            return Err(DraftingError::Upstream(format!(
                "scripted failure for marker: {marker}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageGateway for MockGateway {
    async fn chat_json(
        &self,
        tier: ModelTier,
        _temperature: f32,
        system: &str,
        user: &str,
        _schema: serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.record(tier, system, user);
        self.apply_delay(system, user).await;
        self.check_failure(system, user)?;

        let responses = self.json_responses.lock().unwrap();
        responses
            .iter()
            .rev()
            .find(|(marker, _)| system.contains(marker.as_str()) || user.contains(marker.as_str()))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                DraftingError::Schema(format!(
                    "no scripted JSON response for prompt: {}",
                    &system.chars().take(40).collect::<String>()
                ))
            })
    }

    async fn chat_text(
        &self,
        tier: ModelTier,
        _temperature: f32,
        system: &str,
        user: &str,
    ) -> Result<String> {
        self.record(tier, system, user);
        self.apply_delay(system, user).await;
        self.check_failure(system, user)?;

        let responses = self.text_responses.lock().unwrap();
        responses
            .iter()
            .rev()
            .find(|(marker, _)| system.contains(marker.as_str()) || user.contains(marker.as_str()))
            .map(|(_, text)| text.clone())
            .ok_or_else(|| {
                DraftingError::Schema(format!(
                    "no scripted text response for prompt: {}",
                    &system.chars().take(40).collect::<String>()
                ))
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embedding_for(text))
    }
}

/// A reranker with scripted scores.
///
/// A text scores the value of the first key it contains; unmatched texts
/// score 0.
#[derive(Default)]
pub struct MockReranker {
    scores: Vec<(String, f32)>,
}

impl MockReranker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(mut self, marker: impl Into<String>, score: f32) -> Self {
        self.scores.push((marker.into(), score));
        self
    }
}

#[async_trait]
impl Reranker for MockReranker {
    async fn score_pairs(&self, _query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        Ok(texts
            .iter()
            .map(|text| {
                self.scores
                    .iter()
                    .find(|(marker, _)| text.contains(marker.as_str()))
                    .map(|(_, score)| *score)
                    .unwrap_or(0.0)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_marker_matching() {
        let gateway = MockGateway::new(4)
            .with_json("分類", serde_json::json!({"ok": true}))
            .with_text("クエリ", "キーワード1 キーワード2");

        let value = gateway
            .chat_json(ModelTier::Lite, 0.0, "分類の指示", "素材", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);

        let text = gateway
            .chat_text(ModelTier::Lite, 0.0, "クエリの指示", "素材")
            .await
            .unwrap();
        assert_eq!(text, "キーワード1 キーワード2");

        assert_eq!(gateway.calls().len(), 2);
        assert_eq!(gateway.calls_matching("クエリ"), 1);
    }

    #[tokio::test]
    async fn test_unscripted_prompt_is_schema_error() {
        let gateway = MockGateway::new(4);
        let err = gateway
            .chat_json(ModelTier::High, 0.0, "謎の指示", "素材", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let gateway = MockGateway::new(4).with_failure("壊れる");
        let err = gateway
            .chat_text(ModelTier::Lite, 0.0, "壊れる処理", "素材")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream");
    }

    #[test]
    fn test_embeddings_deterministic_and_normalized() {
        let gateway = MockGateway::new(8);
        let a = gateway.embedding_for("テーマ");
        let b = gateway.embedding_for("テーマ");
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_reranker_scores() {
        let reranker = MockReranker::new().with_score("重要", 3.0);
        let scores = reranker.score_pairs("q", &["重要な文", "その他"]).await.unwrap();
        assert_eq!(scores, vec![3.0, 0.0]);
    }
}
