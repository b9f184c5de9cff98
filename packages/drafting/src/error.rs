//! Typed errors for the drafting library.
//!
//! Uses `thiserror` enums rather than `anyhow` so callers can match on the
//! failure class. `kind()` yields the wire tag carried by SSE error events.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during draft generation.
#[derive(Debug, Error)]
pub enum DraftingError {
    /// Transient LLM/embedding failure that survived the retry budget
    #[error("upstream model failure: {0}")]
    Upstream(String),

    /// Model output did not match the declared schema
    #[error("model output did not match schema: {0}")]
    Schema(String),

    /// Document store failure or partial retrieval fan-out failure
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// Draft/history storage failure
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Per-call or per-request deadline exceeded
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Unknown identifier
    #[error("not found: {0}")]
    NotFound(String),

    /// Internal invariant violation
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// Client cancellation observed
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl DraftingError {
    /// Wire tag for the SSE `error` event and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            DraftingError::Upstream(_) => "upstream",
            DraftingError::Schema(_) => "schema",
            DraftingError::Retrieval(_) => "retrieval",
            DraftingError::Storage(_) => "storage",
            DraftingError::Timeout(_) => "timeout",
            DraftingError::NotFound(_) => "not_found",
            DraftingError::Invariant(_) => "invariant",
            DraftingError::Cancelled => "cancelled",
            DraftingError::Config(_) => "config",
        }
    }
}

/// Result type alias for drafting operations.
pub type Result<T> = std::result::Result<T, DraftingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(DraftingError::Upstream("x".into()).kind(), "upstream");
        assert_eq!(DraftingError::Schema("x".into()).kind(), "schema");
        assert_eq!(DraftingError::Retrieval("x".into()).kind(), "retrieval");
        assert_eq!(
            DraftingError::Timeout(Duration::from_secs(60)).kind(),
            "timeout"
        );
        assert_eq!(DraftingError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(DraftingError::Cancelled.kind(), "cancelled");
    }
}
