//! End-to-end summarization pipeline
//!
//! `prepare` runs extraction, analysis and strategy selection without
//! touching the quota. `summarize` runs the chosen plan.

use distill_core::clock::{Clock, SystemClock};
use distill_core::config::LayeredConfig;
use distill_core::error::Result;
use distill_core::formats::ExtractorRegistry;
use distill_core::models::{
    Document, ExecutionPlan, ExtractionResult, ProcessingOption, RateLimitStatus,
};
use distill_core::processing::{Analysis, AnalyzerConfig, StructuralAnalyzer};
use distill_llm::{summarizer_from_config, SummaryStyle};
use distill_store::KeyValueStore;
use std::sync::Arc;
use std::time::Instant;

use crate::models::{CancelToken, OrchestrationError, PipelineProgress, PipelineState, Summary};
use crate::orchestrator::{OrchestratorConfig, RequestOrchestrator};
use crate::quota::QuotaTracker;
use crate::selector::StrategySelector;

/// A document that has been extracted, analyzed and offered strategies
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub document: Document,
    pub extraction: ExtractionResult,
    pub analysis: Analysis,
    /// Recommended option first
    pub options: Vec<ProcessingOption>,
    /// Quota at selection time
    pub quota: RateLimitStatus,
}

impl PreparedDocument {
    pub fn text(&self) -> &str {
        &self.extraction.text
    }

    pub fn char_count(&self) -> usize {
        self.extraction.text.chars().count()
    }

    pub fn recommended(&self) -> Option<&ProcessingOption> {
        self.options.iter().find(|o| o.recommended).or_else(|| self.options.first())
    }
}

pub struct SummaryPipeline {
    extractors: ExtractorRegistry,
    analyzer: StructuralAnalyzer,
    orchestrator: RequestOrchestrator,
}

impl SummaryPipeline {
    pub fn new(
        extractors: ExtractorRegistry,
        analyzer: StructuralAnalyzer,
        orchestrator: RequestOrchestrator,
    ) -> Self {
        Self { extractors, analyzer, orchestrator }
    }

    /// Build a pipeline with built-in extractors and the configured summarizer
    pub async fn from_config(config: &LayeredConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        Self::with_clock(config, store, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        config: &LayeredConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let summarizer = summarizer_from_config(config)?;
        let quota = Arc::new(QuotaTracker::load(config.daily_cap.value, clock, store).await?);
        let orchestrator =
            RequestOrchestrator::new(summarizer, quota, OrchestratorConfig::from_config(config));

        Ok(Self::new(
            ExtractorRegistry::with_builtin(),
            StructuralAnalyzer::new(AnalyzerConfig::from_config(config)),
            orchestrator,
        ))
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        self.orchestrator.quota()
    }

    pub fn extractors_mut(&mut self) -> &mut ExtractorRegistry {
        &mut self.extractors
    }

    pub fn summarizer_name(&self) -> String {
        self.orchestrator.summarizer_name()
    }

    /// Extract, analyze and select strategies for `document`
    pub async fn prepare<F>(&self, document: Document, mut progress: F) -> Result<PreparedDocument>
    where
        F: FnMut(PipelineProgress),
    {
        progress(PipelineProgress::new(
            PipelineState::Extracting,
            format!("Extracting text from {}", document.name()),
        ));
        let started = Instant::now();
        let extraction = match self.extractors.extract(&document).await {
            Ok(extraction) => extraction,
            Err(error) => {
                progress(PipelineProgress::new(PipelineState::Failed, error.to_string()));
                return Err(error);
            }
        };
        let extraction_time = started.elapsed();

        progress(PipelineProgress::new(PipelineState::Analyzing, "Analyzing structure"));
        let analysis = match self.analyzer.analyze(&extraction) {
            Ok(analysis) => analysis.with_extraction_time(extraction_time),
            Err(error) => {
                progress(PipelineProgress::new(PipelineState::Failed, error.to_string()));
                return Err(error);
            }
        };

        progress(PipelineProgress::new(PipelineState::Selecting, "Choosing a processing strategy"));
        let quota = self.quota().status();
        let char_count = extraction.text.chars().count();
        let options = StrategySelector::select(char_count, &analysis.structure, &quota);

        tracing::info!(
            document = %document.name(),
            chars = char_count,
            document_type = ?analysis.structure.document_type,
            options = options.len(),
            "Prepared document"
        );

        Ok(PreparedDocument { document, extraction, analysis, options, quota })
    }

    /// Run `plan` over a prepared document
    pub async fn summarize<F>(
        &self,
        prepared: &PreparedDocument,
        plan: &ExecutionPlan,
        style: SummaryStyle,
        cancel: &CancelToken,
        progress: F,
    ) -> std::result::Result<Summary, OrchestrationError>
    where
        F: FnMut(PipelineProgress),
    {
        self.orchestrator
            .execute(prepared.text(), &prepared.analysis.structure, plan, style, cancel, progress)
            .await
    }
}
