//! Verification: style checking, conditional rewrite, and hallucination
//! detection with unverified-claim tagging.

pub mod hallucination;
pub mod rewrite;
pub mod style_check;

pub use hallucination::{
    apply_tags, HallucinationCheckResult, HallucinationDetectorChain, HallucinationInput,
    UnverifiedClaim,
};
pub use rewrite::{apply_rewrite, AutoRewriteChain, RewriteInput, RewriteResult};
pub use style_check::{
    CorrectedSection, Severity, StyleCheckInput, StyleCheckResult, StyleCheckerChain, StyleIssue,
};

use std::sync::Arc;

use crate::chains::{Chain, InputParserChain, StyleAnalysis};
use crate::error::Result;
use crate::traits::ai::LanguageGateway;

/// Standalone verification surface: runs the style check and the
/// hallucination detector against supplied draft text, outside a
/// generation run.
pub struct Verifier {
    input_parser: InputParserChain,
    style_checker: StyleCheckerChain,
    detector: HallucinationDetectorChain,
}

impl Verifier {
    pub fn new(gateway: Arc<dyn LanguageGateway>) -> Self {
        Self {
            input_parser: InputParserChain::new(gateway.clone()),
            style_checker: StyleCheckerChain::new(gateway.clone()),
            detector: HallucinationDetectorChain::new(gateway),
        }
    }

    /// Verify a draft text against its input material. With no retrieval
    /// context available, the style check runs against the default style
    /// baseline.
    pub async fn verify(
        &self,
        draft_text: &str,
        input_material: &str,
    ) -> Result<(StyleCheckResult, HallucinationCheckResult)> {
        let parsed = self.input_parser.run(input_material.to_string()).await?;

        let style = self
            .style_checker
            .run(StyleCheckInput {
                draft_text: draft_text.to_string(),
                style: StyleAnalysis::default(),
                style_profile: String::new(),
            })
            .await?;

        let hallucination = self
            .detector
            .run(HallucinationInput {
                draft_text: draft_text.to_string(),
                input: parsed,
                passages: Vec::new(),
            })
            .await?;

        Ok((style, hallucination))
    }
}
