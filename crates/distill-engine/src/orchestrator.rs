//! Request orchestration
//!
//! Executes an [`ExecutionPlan`]: partitions the text, dispatches chunk
//! requests with bounded concurrency, retries transient failures with
//! exponential backoff, and aggregates results in source order.

use distill_core::classify::{classify, RawFailure};
use distill_core::config::LayeredConfig;
use distill_core::error::AppError;
use distill_core::models::{ExecutionPlan, StructuredData};
use distill_core::processing::{partition, truncate_at_sentence, ChunkBoundary, TextChunk};
use distill_llm::{Summarizer, SummaryStyle};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::models::{
    join_summaries, CancelToken, ChunkSummary, OrchestrationError, PartialSummary,
    PipelineProgress, PipelineState, Summary,
};
use crate::quota::QuotaTracker;

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Chunk requests in flight at once
    pub max_in_flight: usize,
    /// Deadline for one backend request
    pub request_timeout: Duration,
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each later one
    pub backoff_base: Duration,
    pub chunk_boundary: ChunkBoundary,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 2,
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_base: Duration::from_secs(1),
            chunk_boundary: ChunkBoundary::Section,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            max_in_flight: config.max_in_flight.value.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs.value),
            max_attempts: config.max_attempts.value.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms.value),
            chunk_boundary: config.chunk_boundary.value,
        }
    }
}

/// Result of one request, after retries
enum Dispatch {
    Done(String),
    Failed(AppError),
    /// Cancelled between attempts
    Abandoned,
}

enum ChunkOutcome {
    Completed(ChunkSummary),
    Failed { index: usize, error: AppError },
    /// Not dispatched because the run was cancelled or halted
    Skipped,
}

/// Dispatches summarization requests for an execution plan
pub struct RequestOrchestrator {
    summarizer: Arc<dyn Summarizer>,
    quota: Arc<QuotaTracker>,
    config: OrchestratorConfig,
}

impl RequestOrchestrator {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        quota: Arc<QuotaTracker>,
        config: OrchestratorConfig,
    ) -> Self {
        Self { summarizer, quota, config }
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub fn summarizer_name(&self) -> String {
        self.summarizer.name()
    }

    /// Execute `plan` over `text`.
    ///
    /// Every request reserves one unit of quota before it is sent; a request
    /// the quota cannot admit fails the run with `RateLimit` and is not
    /// retried. A non-transient failure stops further chunks from being
    /// dispatched. Requests already in flight when `cancel` fires finish,
    /// but their results are discarded unless every chunk had already
    /// completed.
    pub async fn execute<F>(
        &self,
        text: &str,
        structure: &StructuredData,
        plan: &ExecutionPlan,
        style: SummaryStyle,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<Summary, OrchestrationError>
    where
        F: FnMut(PipelineProgress),
    {
        let source = match plan.input_limit {
            Some(limit) => truncate_at_sentence(text, limit),
            None => text,
        };

        let chunks = if plan.chunk_count <= 1 {
            whole_text(source)
        } else {
            partition(source, structure, plan.chunk_count, self.config.chunk_boundary)
        };
        if chunks.is_empty() {
            return Err(AppError::invalid_input("No text to summarize").into());
        }

        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled { drained: 0 });
        }

        let total = chunks.len();
        tracing::info!(
            strategy = %plan.strategy,
            chunks = total,
            consolidate = plan.consolidate,
            truncated = source.len() < text.len(),
            "Dispatching summarization requests"
        );
        progress(PipelineProgress::step(
            PipelineState::Dispatching,
            0,
            total,
            format!("Summarizing {} chunk(s)", total),
        ));

        let halt = AtomicBool::new(false);
        let mut outcomes = stream::iter(chunks.iter())
            .map(|chunk| self.run_chunk(chunk, style, cancel, &halt))
            .buffer_unordered(self.config.max_in_flight.max(1));

        let mut completed: Vec<ChunkSummary> = Vec::with_capacity(total);
        let mut failures: Vec<(usize, AppError)> = Vec::new();
        // Outcomes that arrived after the cancel was observed
        let mut drained = 0;

        while let Some(outcome) = outcomes.next().await {
            let after_cancel = cancel.is_cancelled();
            match outcome {
                ChunkOutcome::Completed(summary) => {
                    drained += usize::from(after_cancel);
                    let index = summary.index;
                    completed.push(summary);
                    progress(PipelineProgress::step(
                        PipelineState::Dispatching,
                        completed.len(),
                        total,
                        format!("Chunk {} of {} summarized", index + 1, total),
                    ));
                }
                ChunkOutcome::Failed { index, error } => {
                    drained += usize::from(after_cancel);
                    failures.push((index, error));
                }
                ChunkOutcome::Skipped => {}
            }
        }
        drop(outcomes);

        completed.sort_by_key(|c| c.index);
        failures.sort_by_key(|(index, _)| *index);

        if cancel.is_cancelled() && completed.len() < total {
            tracing::info!(drained, "Summarization cancelled");
            return Err(OrchestrationError::Cancelled { drained });
        }

        if completed.len() < total {
            let error = surface_error(&failures, completed.len(), total);
            tracing::warn!(
                completed = completed.len(),
                total,
                code = error.code(),
                "Summarization failed: {}",
                error
            );
            progress(PipelineProgress::new(PipelineState::Failed, error.to_string()));
            let partial =
                (!completed.is_empty()).then(|| PartialSummary::from_completed(completed, total));
            return Err(OrchestrationError::Failed { error, partial });
        }

        progress(PipelineProgress::new(PipelineState::Aggregating, "Combining chunk summaries"));
        let joined = join_summaries(&completed);

        let (text, consolidated) = if plan.consolidate && completed.len() > 1 {
            if cancel.is_cancelled() {
                return Err(OrchestrationError::Cancelled { drained });
            }
            match self.dispatch("consolidation", &joined, style, cancel).await {
                Dispatch::Done(text) => (text, true),
                Dispatch::Failed(error) => {
                    tracing::warn!(code = error.code(), "Consolidation failed: {}", error);
                    progress(PipelineProgress::new(PipelineState::Failed, error.to_string()));
                    return Err(OrchestrationError::Failed {
                        error,
                        partial: Some(PartialSummary::from_completed(completed, total)),
                    });
                }
                Dispatch::Abandoned => {
                    return Err(OrchestrationError::Cancelled { drained });
                }
            }
        } else {
            (joined, false)
        };

        let requests_used = completed.len() as u32 + u32::from(consolidated);
        progress(PipelineProgress::step(
            PipelineState::Complete,
            total,
            total,
            format!("Summary ready ({} requests)", requests_used),
        ));
        tracing::info!(strategy = %plan.strategy, requests_used, consolidated, "Summarization complete");

        Ok(Summary {
            text,
            strategy: plan.strategy,
            chunk_summaries: completed,
            requests_used,
            consolidated,
        })
    }

    async fn run_chunk(
        &self,
        chunk: &TextChunk,
        style: SummaryStyle,
        cancel: &CancelToken,
        halt: &AtomicBool,
    ) -> ChunkOutcome {
        if cancel.is_cancelled() || halt.load(Ordering::SeqCst) {
            return ChunkOutcome::Skipped;
        }

        let label = format!("chunk {}", chunk.index + 1);
        match self.dispatch(&label, &chunk.text, style, cancel).await {
            Dispatch::Done(text) => ChunkOutcome::Completed(ChunkSummary {
                index: chunk.index,
                span: chunk.span.clone(),
                text,
            }),
            Dispatch::Failed(error) => {
                if !error.is_transient() {
                    halt.store(true, Ordering::SeqCst);
                }
                ChunkOutcome::Failed { index: chunk.index, error }
            }
            Dispatch::Abandoned => ChunkOutcome::Skipped,
        }
    }

    /// Send one request, retrying transient failures
    async fn dispatch(
        &self,
        label: &str,
        text: &str,
        style: SummaryStyle,
        cancel: &CancelToken,
    ) -> Dispatch {
        let reservation = match self.quota.reserve(1) {
            Ok(reservation) => reservation,
            Err(error) => return Dispatch::Failed(error),
        };

        let mut attempt = 1;
        loop {
            tracing::debug!(label, attempt, chars = text.len(), "Sending request");

            let result =
                match tokio::time::timeout(self.config.request_timeout, self.summarizer.summarize(text, style))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(classify(RawFailure::Timeout { after: self.config.request_timeout })),
                };

            match result {
                Ok(summary) => {
                    reservation.commit().await;
                    return Dispatch::Done(summary);
                }
                Err(error) if error.is_retryable() && attempt < self.config.max_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        label,
                        attempt,
                        max_attempts = self.config.max_attempts,
                        "Request failed: {}, retrying in {:?}",
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    if cancel.is_cancelled() {
                        return Dispatch::Abandoned;
                    }
                    attempt += 1;
                }
                Err(error) => {
                    tracing::warn!(label, attempt, code = error.code(), "Request failed: {}", error);
                    return Dispatch::Failed(error);
                }
            }
        }
    }

    /// `backoff_base * 2^(attempt - 1)`
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.config.backoff_base.saturating_mul(factor)
    }
}

fn whole_text(text: &str) -> Vec<TextChunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    vec![TextChunk { index: 0, span: 0..text.len(), text: text.trim().to_string() }]
}

/// Error reported for a run with missing chunks.
///
/// A non-transient failure is surfaced as-is. So is the failure of a run
/// where nothing completed and every chunk failed the same way, which
/// keeps a one-request run's `Network` or `ModelLoading` intact. Otherwise
/// the run reports a server error naming the chunks that exhausted their
/// retries.
fn surface_error(failures: &[(usize, AppError)], completed: usize, total: usize) -> AppError {
    if let Some((_, error)) = failures.iter().find(|(_, e)| !e.is_transient()) {
        return error.clone();
    }

    let Some((_, last)) = failures.last() else {
        return AppError::unknown("Chunks were not dispatched");
    };

    let same_kind = failures
        .iter()
        .all(|(_, e)| std::mem::discriminant(e) == std::mem::discriminant(last));
    if total == 1 || (completed == 0 && same_kind) {
        return last.clone();
    }

    let numbers: Vec<String> = failures.iter().map(|(i, _)| (i + 1).to_string()).collect();
    AppError::server(format!(
        "{} of {} chunks failed after retries (chunk {}): {}",
        failures.len(),
        total,
        numbers.join(", "),
        last
    ))
}
