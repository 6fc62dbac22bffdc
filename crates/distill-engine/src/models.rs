use distill_core::error::AppError;
use distill_core::models::ProcessingStrategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Pipeline state transitions reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Idle,
    Extracting,
    Analyzing,
    Selecting,
    Dispatching,
    Aggregating,
    Complete,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "IDLE",
            Self::Extracting => "EXTRACTING",
            Self::Analyzing => "ANALYZING",
            Self::Selecting => "SELECTING",
            Self::Dispatching => "DISPATCHING",
            Self::Aggregating => "AGGREGATING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Progress information for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineProgress {
    pub state: PipelineState,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl PipelineProgress {
    pub fn new(state: PipelineState, message: impl Into<String>) -> Self {
        Self { state, current: 0, total: 0, message: message.into() }
    }

    pub fn step(state: PipelineState, current: usize, total: usize, message: impl Into<String>) -> Self {
        Self { state, current, total, message: message.into() }
    }
}

/// Summary of one chunk of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub index: usize,
    /// Byte span of the chunk in the source text
    pub span: Range<usize>,
    pub text: String,
}

/// Result of a completed orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub strategy: ProcessingStrategy,
    /// Per-chunk summaries in source order
    pub chunk_summaries: Vec<ChunkSummary>,
    /// Requests that completed and were charged to the quota
    pub requests_used: u32,
    pub consolidated: bool,
}

/// What completed before a run failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSummary {
    /// Completed chunk summaries joined in source order
    pub text: String,
    pub completed: Vec<ChunkSummary>,
    /// Indices of chunks that failed or were never dispatched
    pub missing_chunks: Vec<usize>,
    pub total_chunks: usize,
}

impl PartialSummary {
    pub(crate) fn from_completed(completed: Vec<ChunkSummary>, total_chunks: usize) -> Self {
        let missing_chunks =
            (0..total_chunks).filter(|i| !completed.iter().any(|c| c.index == *i)).collect();
        Self { text: join_summaries(&completed), completed, missing_chunks, total_chunks }
    }
}

/// Failure outcome of an orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("{error}")]
    Failed { error: AppError, partial: Option<PartialSummary> },

    #[error("Summarization cancelled ({drained} in-flight requests drained)")]
    Cancelled { drained: usize },
}

impl OrchestrationError {
    /// The classified error, unless the run was cancelled
    pub fn app_error(&self) -> Option<&AppError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            Self::Cancelled { .. } => None,
        }
    }

    pub fn partial(&self) -> Option<&PartialSummary> {
        match self {
            Self::Failed { partial, .. } => partial.as_ref(),
            Self::Cancelled { .. } => None,
        }
    }
}

impl From<AppError> for OrchestrationError {
    fn from(error: AppError) -> Self {
        Self::Failed { error, partial: None }
    }
}

/// Cloneable cancellation flag shared between a caller and a running pipeline
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub(crate) fn join_summaries(chunks: &[ChunkSummary]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n\n")
}
