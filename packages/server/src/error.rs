//! HTTP error mapping for the drafting taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drafting::DraftingError;

/// An API error: the taxonomy kind plus a human-readable message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "schema",
            message: message.into(),
        }
    }
}

impl From<DraftingError> for ApiError {
    fn from(e: DraftingError) -> Self {
        let status = match &e {
            DraftingError::NotFound(_) => StatusCode::NOT_FOUND,
            DraftingError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DraftingError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "kind": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let e: ApiError = DraftingError::NotFound("draft x".into()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.kind, "not_found");

        let e: ApiError = DraftingError::Schema("bad".into()).into();
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);

        let e: ApiError = DraftingError::Upstream("boom".into()).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.kind, "upstream");
    }
}
