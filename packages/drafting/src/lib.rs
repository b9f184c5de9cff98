//! Retrieval-and-generation pipeline for recruiting article drafts.
//!
//! Turns a block of raw input material into a first-draft article in one
//! of four categories, using a corpus of previously published articles as
//! reference:
//!
//! 1. Parse the material into a structured brief and classify it.
//! 2. Fan out a three-way knowledge-base lookup: hybrid (vector + trigram,
//!    RRF-fused, optionally cross-encoder-reranked) content search, the
//!    per-category style rulebook, and theme-matched style excerpts.
//! 3. Drive the staged generator: outline, then title/lead/sections/
//!    closing concurrently.
//! 4. Verify: style-consistency check with conditional rewrite, and
//!    hallucination detection with `[要確認: …]` tagging.
//!
//! Per-stage progress is exposed over an event channel the transport
//! drains as SSE.

pub mod chains;
pub mod config;
pub mod error;
pub mod gateway;
pub mod pipeline;
pub mod rerank;
pub mod retriever;
pub mod store;
pub mod testing;
pub mod traits;
pub mod types;
pub mod verification;

pub use config::GenerationConfig;
pub use error::{DraftingError, Result};
pub use gateway::TieredGateway;
pub use pipeline::GenerationPipeline;
pub use rerank::HttpReranker;
pub use retriever::{HybridSearcher, StyleRetriever};
pub use store::{MemoryStore, PostgresStore};
pub use traits::{
    ArticleStore, DocumentStore, DraftStore, DraftSummary, LanguageGateway, ModelTier, Reranker,
    StoredDraft,
};
pub use types::{
    ArticleType, Draft, GenerationEvent, Outline, Passage, RetrievalBundle, Section, Stage,
    StructuredInput, StyleKind, StyleRecord,
};
pub use verification::Verifier;
