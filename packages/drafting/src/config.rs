//! Generation configuration.
//!
//! One immutable record passed to the pipeline constructor. Feature flags
//! are enumerated booleans; there is no ambient settings singleton.

use std::time::Duration;

/// Tuning knobs and feature flags for a generation pipeline.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Route lightweight chains to the lite model tier. When off, every
    /// call uses the high tier.
    pub use_lite_model: bool,

    /// Generate the hybrid-search query with the query-generator chain.
    /// When off, the query is the parsed keywords joined by spaces.
    pub use_query_generator: bool,

    /// Consult the style-profile knowledge base (rulebook + excerpts).
    /// When off, the analyzer outputs are used alone.
    pub use_style_profile_kb: bool,

    /// Rewrite the draft when the consistency score falls below 0.8.
    pub use_auto_rewrite: bool,

    /// Results requested from each search lane before fusion.
    pub hybrid_search_k: usize,

    /// RRF fusion constant.
    pub rrf_k: u32,

    /// Result count after fusion.
    pub final_k: usize,

    /// Result count after reranking.
    pub reranker_top_k: usize,

    /// Style excerpts attached to the bundle.
    pub excerpt_top_k: usize,

    /// Concurrent section generations (FIFO beyond the cap).
    pub max_parallel_sections: usize,

    /// Deadline for a single upstream call.
    pub call_timeout: Duration,

    /// End-to-end deadline for one generation request.
    pub request_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            use_lite_model: true,
            use_query_generator: true,
            use_style_profile_kb: true,
            use_auto_rewrite: true,
            hybrid_search_k: 20,
            rrf_k: 60,
            final_k: 10,
            reranker_top_k: 5,
            excerpt_top_k: 5,
            max_parallel_sections: 4,
            call_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_secs(600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert!(config.use_query_generator);
        assert_eq!(config.rrf_k, 60);
        assert_eq!(config.final_k, 10);
        assert_eq!(config.max_parallel_sections, 4);
        assert_eq!(config.call_timeout, Duration::from_secs(60));
    }
}
