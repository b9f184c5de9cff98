//! Standalone verification route.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use drafting::verification::{HallucinationCheckResult, StyleCheckResult};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// The draft text to verify.
    pub draft_text: String,

    /// The material the draft was generated from; facts are checked
    /// against it.
    pub input_material: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub style: StyleCheckResult,
    pub hallucination: HallucinationCheckResult,
}

/// `POST /api/verify` — run the style check and hallucination detector
/// against supplied text.
pub async fn verify_handler(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    if request.draft_text.trim().is_empty() {
        return Err(ApiError::bad_request("draft_text must not be empty"));
    }

    let (style, hallucination) = state
        .verifier
        .verify(&request.draft_text, &request.input_material)
        .await?;

    Ok(Json(VerifyResponse {
        style,
        hallucination,
    }))
}
