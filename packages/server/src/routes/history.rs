//! Generation history routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use drafting::{DraftSummary, StoredDraft};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// `GET /api/history` — past generations, newest first.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DraftSummary>>, ApiError> {
    let drafts = state
        .store
        .list_drafts(params.limit.min(100), params.offset)
        .await?;
    Ok(Json(drafts))
}

/// `GET /api/history/{id}`.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StoredDraft>, ApiError> {
    let stored = state.store.get_draft(id).await?;
    Ok(Json(stored))
}

/// `DELETE /api/history/{id}`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_draft(id).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}
