//! Direct hybrid-search route.

use std::str::FromStr;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use drafting::{ArticleType, Passage};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub article_type: String,

    /// Result count after fusion.
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    10
}

/// `POST /api/search` — expose the hybrid searcher directly.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<Passage>>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    let category = ArticleType::from_str(&request.article_type)
        .map_err(|_| ApiError::bad_request(format!("unknown article_type: {}", request.article_type)))?;

    let passages = state
        .searcher
        .search(
            &request.query,
            category,
            state.config.generation.hybrid_search_k,
            request.k,
            state.config.generation.rrf_k,
        )
        .await?;

    Ok(Json(passages))
}
