//! Retrieval: hybrid content search and style-asset lookup.

pub mod hybrid;
pub mod style;

pub use hybrid::{fuse, rrf_score, FusedPassage, HybridSearcher};
pub use style::StyleRetriever;
