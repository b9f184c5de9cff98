//! Generation routes: synchronous and SSE-streaming.

use std::convert::Infallible;
use std::str::FromStr;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use drafting::{ArticleType, Draft};

use crate::app::AppState;
use crate::error::ApiError;

/// Capacity of the per-request event channel.
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub input_material: String,

    /// `"auto"` (or absent) lets the classifier decide.
    #[serde(default)]
    pub article_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(flatten)]
    pub draft: Draft,
    pub markdown: String,
}

fn requested_category(raw: &Option<String>) -> Result<Option<ArticleType>, ApiError> {
    match raw.as_deref() {
        None | Some("") | Some("auto") => Ok(None),
        Some(value) => ArticleType::from_str(value)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("unknown article_type: {value}"))),
    }
}

/// `POST /api/generate` — run the full pipeline and return the draft.
pub async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if request.input_material.trim().is_empty() {
        return Err(ApiError::bad_request("input_material must not be empty"));
    }

    let requested = requested_category(&request.article_type)?;
    let draft = state
        .pipeline
        .generate(&request.input_material, requested)
        .await?;

    let markdown = draft.to_markdown();
    Ok(Json(GenerateResponse { draft, markdown }))
}

/// `POST /api/generate/stream` — SSE progress events, then a terminal
/// `complete` or `error` event. Client disconnect cancels the run.
pub async fn generate_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.input_material.trim().is_empty() {
        return Err(ApiError::bad_request("input_material must not be empty"));
    }
    let requested = requested_category(&request.article_type)?;

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let cancel = CancellationToken::new();

    let pipeline = state.pipeline.clone();
    let run_cancel = cancel.clone();
    tokio::spawn(async move {
        pipeline
            .generate_stream(request.input_material, requested, tx, run_cancel)
            .await;
    });

    // Dropping the stream (client disconnect) drops the receiver; the
    // pipeline observes the closed channel at its next progress emit and
    // cancels. The token makes the cancellation prompt even mid-stage.
    let guard = DropGuard { cancel };
    let stream = ReceiverStream::new(rx).map(move |event| {
        let _keep_alive = &guard;
        Ok::<_, Infallible>(
            Event::default()
                .event(event.event_name())
                .data(event.data().to_string()),
        )
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct DropGuard {
    cancel: CancellationToken,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_category_parsing() {
        assert_eq!(requested_category(&None).unwrap(), None);
        assert_eq!(requested_category(&Some("auto".into())).unwrap(), None);
        assert_eq!(
            requested_category(&Some("INTERVIEW".into())).unwrap(),
            Some(ArticleType::Interview)
        );
        assert!(requested_category(&Some("PODCAST".into())).is_err());
    }
}
