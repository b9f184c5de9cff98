//! Shared types: corpus records, the structured brief, outlines, drafts,
//! and the SSE event envelopes.

pub mod article;
pub mod draft;
pub mod events;
pub mod input;
pub mod outline;

pub use article::{ArticleType, Passage, StyleKind, StyleRecord};
pub use draft::{unverified_marker, Draft, Section, UNVERIFIED_TAG_PREFIX};
pub use events::{GenerationEvent, Stage};
pub use input::{InterviewQuote, Person, StructuredInput};
pub use outline::{HeadingLevel, Outline, OutlineSection};

/// Result of the retrieval fan-out: content passages plus style assets.
#[derive(Debug, Clone, Default)]
pub struct RetrievalBundle {
    /// Reference passages, ordered and deduplicated.
    pub passages: Vec<Passage>,

    /// Style rulebook body for the category. Empty when the category has
    /// no profile record.
    pub style_profile: String,

    /// Theme-matched style excerpts, ordered.
    pub style_excerpts: Vec<String>,
}

impl RetrievalBundle {
    /// Bodies of the reference passages, for analyzer and outline prompts.
    pub fn passage_bodies(&self) -> Vec<String> {
        self.passages.iter().map(|p| p.body.clone()).collect()
    }
}
