//! The generation pipeline: a nine-stage state machine over the chains,
//! the retrievers, and the verification passes.
//!
//! Stage order is strict; the two fan-outs (Retrieve, Contents) run their
//! subtasks concurrently and join before the next stage. Progress events
//! are emitted before each stage; a closed event channel or a tripped
//! cancellation token aborts the run with `Cancelled`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::chains::{
    AnalyzerInput, ArticleClassifierChain, Chain, Classification, ClosingChain, ClosingInput,
    InputParserChain, LeadChain, LeadInput, OutlineChain, OutlineInput, QueryGenInput,
    QueryGeneratorChain, SectionChain, SectionInput, StructureAnalysis, StructureAnalyzerChain,
    StyleAnalysis, StyleAnalyzerChain, TitleChain, TitleInput,
};
use crate::config::GenerationConfig;
use crate::error::{DraftingError, Result};
use crate::retriever::{HybridSearcher, StyleRetriever};
use crate::traits::ai::LanguageGateway;
use crate::traits::store::ArticleStore;
use crate::types::{
    ArticleType, Draft, GenerationEvent, Outline, RetrievalBundle, Section, Stage,
    StructuredInput,
};
use crate::verification::{
    apply_rewrite, apply_tags, AutoRewriteChain, HallucinationCheckResult,
    HallucinationDetectorChain, HallucinationInput, RewriteInput, StyleCheckInput,
    StyleCheckResult, StyleCheckerChain,
};

/// Rewrite trigger threshold. A score of exactly 0.8 does not rewrite.
const REWRITE_THRESHOLD: f32 = 0.8;

/// Progress sink for a run. `Silent` is the synchronous surface; the
/// channel variant treats a closed receiver as client cancellation.
enum Progress {
    Channel(mpsc::Sender<GenerationEvent>),
    Silent,
}

impl Progress {
    async fn emit(&self, stage: Stage) -> Result<()> {
        match self {
            Progress::Channel(tx) => tx
                .send(GenerationEvent::progress(stage))
                .await
                .map_err(|_| DraftingError::Cancelled),
            Progress::Silent => Ok(()),
        }
    }
}

/// The pipeline. Process-wide: all handles are shared singletons, all
/// per-request state lives on the stack of a single `run`.
pub struct GenerationPipeline {
    store: Arc<dyn ArticleStore>,
    searcher: Arc<HybridSearcher>,
    style_retriever: Arc<StyleRetriever>,

    input_parser: InputParserChain,
    classifier: ArticleClassifierChain,
    query_generator: QueryGeneratorChain,
    style_analyzer: StyleAnalyzerChain,
    structure_analyzer: StructureAnalyzerChain,
    outline_chain: OutlineChain,
    title_chain: TitleChain,
    lead_chain: LeadChain,
    section_chain: SectionChain,
    closing_chain: ClosingChain,
    style_checker: StyleCheckerChain,
    rewriter: AutoRewriteChain,
    detector: HallucinationDetectorChain,

    section_limiter: Arc<Semaphore>,
    config: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(
        gateway: Arc<dyn LanguageGateway>,
        store: Arc<dyn ArticleStore>,
        searcher: Arc<HybridSearcher>,
        style_retriever: Arc<StyleRetriever>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            searcher,
            style_retriever,
            input_parser: InputParserChain::new(gateway.clone()),
            classifier: ArticleClassifierChain::new(gateway.clone()),
            query_generator: QueryGeneratorChain::new(gateway.clone()),
            style_analyzer: StyleAnalyzerChain::new(gateway.clone()),
            structure_analyzer: StructureAnalyzerChain::new(gateway.clone()),
            outline_chain: OutlineChain::new(gateway.clone()),
            title_chain: TitleChain::new(gateway.clone()),
            lead_chain: LeadChain::new(gateway.clone()),
            section_chain: SectionChain::new(gateway.clone()),
            closing_chain: ClosingChain::new(gateway.clone()),
            style_checker: StyleCheckerChain::new(gateway.clone()),
            rewriter: AutoRewriteChain::new(gateway.clone()),
            detector: HallucinationDetectorChain::new(gateway),
            section_limiter: Arc::new(Semaphore::new(config.max_parallel_sections.max(1))),
            config,
        }
    }

    /// Synchronous generation: run to completion and persist best-effort.
    #[instrument(skip_all, fields(material_len = input_material.len()))]
    pub async fn generate(
        &self,
        input_material: &str,
        requested: Option<ArticleType>,
    ) -> Result<Draft> {
        let cancel = CancellationToken::new();
        let draft = self
            .run_with_deadline(input_material, requested, &Progress::Silent, &cancel)
            .await?;
        self.persist(input_material, &draft).await;
        Ok(draft)
    }

    /// Streaming generation: emit progress events, then a terminal
    /// `complete` or `error` event. A cancelled run persists nothing and
    /// emits no `complete`.
    #[instrument(skip_all, fields(material_len = input_material.len()))]
    pub async fn generate_stream(
        &self,
        input_material: String,
        requested: Option<ArticleType>,
        events: mpsc::Sender<GenerationEvent>,
        cancel: CancellationToken,
    ) {
        let progress = Progress::Channel(events.clone());
        let result = self
            .run_with_deadline(&input_material, requested, &progress, &cancel)
            .await;

        match result {
            Ok(draft) => {
                self.persist(&input_material, &draft).await;
                let _ = events
                    .send(GenerationEvent::Complete {
                        markdown: draft.to_markdown(),
                        draft_id: draft.id,
                    })
                    .await;
            }
            Err(e) => {
                if matches!(e, DraftingError::Cancelled) {
                    info!("generation cancelled by client");
                } else {
                    warn!(kind = e.kind(), error = %e, "generation failed");
                }
                // Best-effort: the channel may already be gone.
                let _ = events
                    .send(GenerationEvent::Error {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn run_with_deadline(
        &self,
        input_material: &str,
        requested: Option<ArticleType>,
        progress: &Progress,
        cancel: &CancellationToken,
    ) -> Result<Draft> {
        let deadline = self.config.request_timeout;
        let run = async {
            tokio::select! {
                _ = cancel.cancelled() => Err(DraftingError::Cancelled),
                result = self.run_stages(input_material, requested, progress) => result,
            }
        };

        match tokio::time::timeout(deadline, run).await {
            Ok(result) => result,
            Err(_) => Err(DraftingError::Timeout(deadline)),
        }
    }

    async fn run_stages(
        &self,
        input_material: &str,
        requested: Option<ArticleType>,
        progress: &Progress,
    ) -> Result<Draft> {
        // Parse
        progress.emit(Stage::InputParse).await?;
        let parsed = self.input_parser.run(input_material.to_string()).await?;

        // Classify
        progress.emit(Stage::Classify).await?;
        let classification = self.classifier.run(parsed.clone()).await?;
        let category = resolve_category(requested, &classification);
        info!(
            category = %category,
            confidence = classification.confidence,
            "article category resolved"
        );

        // QueryGen
        progress.emit(Stage::QueryGen).await?;
        let query = self.build_query(&parsed, category).await?;

        // Retrieve (fan-out)
        progress.emit(Stage::Retrieve).await?;
        let bundle = self.retrieve(&query, &parsed.theme, category).await?;
        info!(
            passages = bundle.passages.len(),
            excerpts = bundle.style_excerpts.len(),
            has_profile = !bundle.style_profile.is_empty(),
            "retrieval bundle assembled"
        );

        // Analyze
        progress.emit(Stage::Analyze).await?;
        let (style, structure) = self.analyze(&bundle, category).await?;

        // Outline
        progress.emit(Stage::Outline).await?;
        let outline = self
            .outline_chain
            .run(OutlineInput {
                input: parsed.clone(),
                article_type_ja: category.label_ja().to_string(),
                style: style.clone(),
                structure: structure.clone(),
                style_profile: bundle.style_profile.clone(),
                style_excerpts: bundle.style_excerpts.clone(),
                references: bundle.passage_bodies(),
            })
            .await?;

        // Contents (fan-out)
        progress.emit(Stage::Contents).await?;
        let (titles, lead, sections, closing) = self
            .generate_contents(&parsed, category, &outline, &style, &structure, &bundle)
            .await?;

        let mut draft = Draft {
            id: Uuid::new_v4(),
            titles,
            lead,
            sections,
            closing,
            category,
            theme: parsed.theme.clone(),
            desired_length: parsed.desired_length,
            actual_length: 0,
            tag_count: 0,
            consistency_score: 0.0,
            verification_confidence: 0.0,
        };

        // Quality
        progress.emit(Stage::Quality).await?;
        self.run_quality(&mut draft, &parsed, &style, &bundle).await?;

        // Assemble
        progress.emit(Stage::Assemble).await?;
        draft.recompute();
        Ok(draft)
    }

    async fn build_query(&self, parsed: &StructuredInput, category: ArticleType) -> Result<String> {
        if self.config.use_query_generator {
            return self
                .query_generator
                .run(QueryGenInput {
                    input: parsed.clone(),
                    category,
                })
                .await;
        }

        if parsed.keywords.is_empty() {
            Ok(parsed.theme.clone())
        } else {
            Ok(parsed.keywords.join(" "))
        }
    }

    /// Three concurrent retrieval tasks joined into a bundle. A missing
    /// rulebook is an empty string; any task failure fails the stage and
    /// cancels its siblings.
    async fn retrieve(
        &self,
        query: &str,
        theme: &str,
        category: ArticleType,
    ) -> Result<RetrievalBundle> {
        let timeout = self.config.call_timeout;

        let content = with_timeout(timeout, async {
            self.searcher
                .search(
                    query,
                    category,
                    self.config.hybrid_search_k,
                    self.config.final_k,
                    self.config.rrf_k,
                )
                .await
        });

        let profile = with_timeout(timeout, async {
            if self.config.use_style_profile_kb {
                self.style_retriever.retrieve_profile(category).await
            } else {
                Ok(String::new())
            }
        });

        let excerpts = with_timeout(timeout, async {
            if self.config.use_style_profile_kb {
                self.style_retriever
                    .retrieve_excerpts(theme, category, self.config.excerpt_top_k)
                    .await
            } else {
                Ok(Vec::new())
            }
        });

        let (passages, style_profile, style_excerpts) =
            tokio::try_join!(content, profile, excerpts)?;

        Ok(RetrievalBundle {
            passages,
            style_profile,
            style_excerpts,
        })
    }

    /// Style and structure analysis over the references, concurrently.
    /// With no references the defaults stand, without model calls.
    async fn analyze(
        &self,
        bundle: &RetrievalBundle,
        category: ArticleType,
    ) -> Result<(StyleAnalysis, StructureAnalysis)> {
        if bundle.passages.is_empty() {
            return Ok((StyleAnalysis::default(), StructureAnalysis::default()));
        }

        let references = bundle.passage_bodies();
        let article_type_ja = category.label_ja().to_string();

        tokio::try_join!(
            self.style_analyzer.run(AnalyzerInput {
                references: references.clone(),
                article_type_ja: article_type_ja.clone(),
            }),
            self.structure_analyzer.run(AnalyzerInput {
                references,
                article_type_ja,
            }),
        )
    }

    /// Title, lead, closing, and one task per outline section, all
    /// concurrent. Section concurrency is capped by the semaphore (FIFO);
    /// the joined section list is re-ordered by outline index.
    async fn generate_contents(
        &self,
        parsed: &StructuredInput,
        category: ArticleType,
        outline: &Outline,
        style: &StyleAnalysis,
        structure: &StructureAnalysis,
        bundle: &RetrievalBundle,
    ) -> Result<(Vec<String>, String, Vec<Section>, String)> {
        let article_type_ja = category.label_ja().to_string();
        let references = bundle.passage_bodies();

        let titles = self.title_chain.run(TitleInput {
            input: parsed.clone(),
            article_type_ja: article_type_ja.clone(),
            outline: outline.clone(),
            style_profile: bundle.style_profile.clone(),
        });

        let lead = self.lead_chain.run(LeadInput {
            input: parsed.clone(),
            article_type_ja: article_type_ja.clone(),
            outline: outline.clone(),
            style: style.clone(),
            structure: structure.clone(),
            style_profile: bundle.style_profile.clone(),
            style_excerpts: bundle.style_excerpts.clone(),
        });

        let closing = self.closing_chain.run(ClosingInput {
            input: parsed.clone(),
            article_type_ja: article_type_ja.clone(),
            outline: outline.clone(),
            style: style.clone(),
            structure: structure.clone(),
            style_profile: bundle.style_profile.clone(),
        });

        let sections = async {
            let tasks = outline.sections.iter().cloned().enumerate().map(|(index, section)| {
                let limiter = self.section_limiter.clone();
                let input = SectionInput {
                    section,
                    input: parsed.clone(),
                    article_type_ja: article_type_ja.clone(),
                    style: style.clone(),
                    style_profile: bundle.style_profile.clone(),
                    passages: references.clone(),
                };
                async move {
                    let _permit = limiter
                        .acquire()
                        .await
                        .map_err(|_| DraftingError::Cancelled)?;
                    let section = self.section_chain.run(input).await?;
                    Ok::<(usize, Section), DraftingError>((index, section))
                }
            });

            let mut indexed = futures::future::join_all(tasks)
                .await
                .into_iter()
                .collect::<Result<Vec<(usize, Section)>>>()?;
            indexed.sort_by_key(|(index, _)| *index);
            Ok(indexed.into_iter().map(|(_, section)| section).collect::<Vec<_>>())
        };

        tokio::try_join!(titles, lead, sections, closing)
    }

    /// Style check, conditional rewrite, hallucination tagging. Quality
    /// verification is best-effort: failures degrade to zero scores and
    /// no tags, never aborting generation.
    async fn run_quality(
        &self,
        draft: &mut Draft,
        parsed: &StructuredInput,
        style: &StyleAnalysis,
        bundle: &RetrievalBundle,
    ) -> Result<()> {
        let composed = draft.compose_text();

        // A degraded check carries a zero score but must not trigger the
        // rewriter; only a real below-threshold verdict does.
        let (check, check_ok) = match self
            .style_checker
            .run(StyleCheckInput {
                draft_text: composed.clone(),
                style: style.clone(),
                style_profile: bundle.style_profile.clone(),
            })
            .await
        {
            Ok(check) => (check, true),
            Err(DraftingError::Cancelled) => return Err(DraftingError::Cancelled),
            Err(e) => {
                warn!(error = %e, "style check failed, continuing without score");
                (StyleCheckResult::degraded(), false)
            }
        };
        draft.consistency_score = check.consistency_score;

        if check_ok && self.config.use_auto_rewrite && check.consistency_score < REWRITE_THRESHOLD
        {
            info!(
                score = check.consistency_score,
                "consistency below threshold, rewriting"
            );
            match self
                .rewriter
                .run(RewriteInput {
                    article_text: composed,
                    check,
                    style_profile: bundle.style_profile.clone(),
                })
                .await
            {
                Ok(result) => {
                    if apply_rewrite(draft, &result.rewritten_text) {
                        info!(changes = result.changes_made.len(), "auto rewrite applied");
                    }
                }
                Err(DraftingError::Cancelled) => return Err(DraftingError::Cancelled),
                Err(e) => warn!(error = %e, "rewrite failed, keeping original draft"),
            }
        }

        let detection = match self
            .detector
            .run(HallucinationInput {
                draft_text: draft.compose_text(),
                input: parsed.clone(),
                passages: bundle.passage_bodies(),
            })
            .await
        {
            Ok(result) => result,
            Err(DraftingError::Cancelled) => return Err(DraftingError::Cancelled),
            Err(e) => {
                warn!(error = %e, "hallucination detection failed, continuing without tags");
                HallucinationCheckResult::degraded()
            }
        };

        draft.verification_confidence = detection.confidence;
        if !detection.unverified_claims.is_empty() {
            info!(
                claims = detection.unverified_claims.len(),
                "unverified claims found, tagging"
            );
            draft.lead = apply_tags(&draft.lead, &detection.unverified_claims);
            for section in &mut draft.sections {
                section.body = apply_tags(&section.body, &detection.unverified_claims);
            }
            draft.closing = apply_tags(&draft.closing, &detection.unverified_claims);
        }

        draft.recompute();
        Ok(())
    }

    /// History writes are best-effort; a failure is logged and swallowed.
    async fn persist(&self, input_material: &str, draft: &Draft) {
        if let Err(e) = self.store.save_draft(input_material, draft).await {
            warn!(error = %e, draft_id = %draft.id, "failed to persist draft");
        }
    }
}

/// Requested category wins unless the classifier disagrees with low
/// confidence (< 0.5), in which case the classifier output is used.
fn resolve_category(requested: Option<ArticleType>, classification: &Classification) -> ArticleType {
    match requested {
        Some(requested)
            if requested != classification.article_type && classification.confidence < 0.5 =>
        {
            classification.article_type
        }
        Some(requested) => requested,
        None => classification.article_type,
    }
}

async fn with_timeout<T>(
    duration: Duration,
    future: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(DraftingError::Timeout(duration)),
    }
}
