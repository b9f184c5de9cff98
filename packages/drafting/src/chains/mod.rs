//! Prompt chains: one small, pure unit per generation stage.
//!
//! A chain is a prompt template, a model-tier choice, and a typed parser.
//! It holds no state beyond its gateway handle, and `run` is a pure
//! function of its input and the gateway call.

pub mod analyzers;
pub mod classifier;
pub mod content;
pub mod input_parser;
pub mod outline;
pub mod prompts;
pub mod query_gen;

pub use analyzers::{
    AnalyzerInput, StructureAnalysis, StructureAnalyzerChain, StyleAnalysis, StyleAnalyzerChain,
};
pub use classifier::{ArticleClassifierChain, Classification};
pub use content::{
    ClosingChain, ClosingInput, LeadChain, LeadInput, SectionChain, SectionInput, TitleChain,
    TitleInput,
};
pub use input_parser::InputParserChain;
pub use outline::{OutlineChain, OutlineInput};
pub use query_gen::{QueryGenInput, QueryGeneratorChain};

use async_trait::async_trait;
use llm_client::StructuredOutput;

use crate::error::{DraftingError, Result};
use crate::traits::ai::{LanguageGateway, ModelTier};

/// A typed generation stage.
#[async_trait]
pub trait Chain: Send + Sync {
    type Input: Send;
    type Output;

    async fn run(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Run a structured chat call and decode the result into `T`.
///
/// The schema is derived from `T` and enforced by the model endpoint; a
/// response that still fails to decode is a schema error, never retried.
pub(crate) async fn invoke_structured<T: StructuredOutput>(
    gateway: &dyn LanguageGateway,
    tier: ModelTier,
    temperature: f32,
    system: &str,
    user: &str,
) -> Result<T> {
    let value = gateway
        .chat_json(tier, temperature, system, user, T::output_schema())
        .await?;

    serde_json::from_value(value)
        .map_err(|e| DraftingError::Schema(format!("{}: {e}", T::type_name())))
}
