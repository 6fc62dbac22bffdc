//! Distill Engine - Strategy selection, quota tracking and request orchestration
//!
//! This crate turns analyzed documents into summaries: it picks a processing
//! strategy under the daily quota, dispatches chunk requests to a summarizer,
//! and persists drafts of in-progress input.

pub mod drafts;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod quota;
pub mod selector;

pub use drafts::{DraftManager, SaveStatus};
pub use models::{
    CancelToken, ChunkSummary, OrchestrationError, PartialSummary, PipelineProgress, PipelineState,
    Summary,
};
pub use orchestrator::{OrchestratorConfig, RequestOrchestrator};
pub use pipeline::{PreparedDocument, SummaryPipeline};
pub use quota::{QuotaReservation, QuotaTracker};
pub use selector::StrategySelector;

pub use distill_llm::SummaryStyle;
