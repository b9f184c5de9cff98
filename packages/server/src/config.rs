//! Server configuration from environment variables.

use std::time::Duration;

use anyhow::{Context, Result};
use drafting::GenerationConfig;

/// Immutable server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,

    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    pub model_high: String,
    pub model_lite: String,
    pub embedding_model: String,

    /// Base URL of the cross-encoder scoring service. Absent disables
    /// reranking.
    pub reranker_url: Option<String>,

    pub generation: GenerationConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let generation = GenerationConfig {
            use_lite_model: env_bool("USE_LITE_MODEL", true),
            use_query_generator: env_bool("USE_QUERY_GENERATOR", true),
            use_style_profile_kb: env_bool("USE_STYLE_PROFILE_KB", true),
            use_auto_rewrite: env_bool("USE_AUTO_REWRITE", true),
            request_timeout: Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECS", 600)),
            call_timeout: Duration::from_secs(env_u64("CALL_TIMEOUT_SECS", 60)),
            ..GenerationConfig::default()
        };

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,
            llm_api_key: std::env::var("LLM_API_KEY").context("LLM_API_KEY not set")?,
            llm_base_url: std::env::var("LLM_BASE_URL").ok(),
            model_high: env_or("MODEL_HIGH", "gemini-2.0-flash"),
            model_lite: env_or("MODEL_LITE", "gemini-2.0-flash-lite"),
            embedding_model: env_or("EMBEDDING_MODEL", "text-embedding-004"),
            reranker_url: std::env::var("RERANKER_URL").ok().filter(|v| !v.is_empty()),
            generation,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_bool_parsing() {
        std::env::set_var("TEST_FLAG_ON", "true");
        std::env::set_var("TEST_FLAG_OFF", "0");
        assert!(env_bool("TEST_FLAG_ON", false));
        assert!(!env_bool("TEST_FLAG_OFF", true));
        assert!(env_bool("TEST_FLAG_MISSING", true));
    }
}
