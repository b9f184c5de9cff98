//! Error types for the LLM client.

use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors returned by [`crate::LlmClient`].
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration error (missing API key, bad base URL)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, DNS, broken transfer)
    #[error("network error: {0}")]
    Network(String),

    /// Rate limit response (HTTP 429)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Non-2xx API response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not parse into the expected shape
    #[error("parse error: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Network failures, rate limits, and 5xx responses are transient;
    /// parse and configuration errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::RateLimited(_) => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Config(_) | LlmError::Parse(_) => false,
        }
    }
}
