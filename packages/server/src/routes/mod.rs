//! HTTP route handlers.

pub mod generate;
pub mod history;
pub mod search;
pub mod verify;

use axum::Json;

/// `GET /health`.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
