//! Orchestration tests against a scripted summarizer

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use distill_core::clock::ManualClock;
use distill_core::error::{AppError, Result};
use distill_core::models::{ExecutionPlan, StructuredData};
use distill_core::processing::StructuralAnalyzer;
use distill_engine::{
    CancelToken, OrchestrationError, OrchestratorConfig, PipelineState, QuotaTracker,
    RequestOrchestrator, SummaryStyle,
};
use distill_llm::Summarizer;
use distill_store::MemoryKeyValueStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Respond = dyn Fn(&str, usize) -> Result<String> + Send + Sync;
type Delay = dyn Fn(&str) -> Duration + Send + Sync;

/// Summarizer double keyed by the first line of each request
struct ScriptedSummarizer {
    respond: Box<Respond>,
    delay: Box<Delay>,
    attempts: Mutex<HashMap<String, usize>>,
    received: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedSummarizer {
    fn new() -> Self {
        Self {
            respond: Box::new(|text, _| echo(text)),
            delay: Box::new(|_| Duration::ZERO),
            attempts: Mutex::new(HashMap::new()),
            received: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    fn respond(mut self, f: impl Fn(&str, usize) -> Result<String> + Send + Sync + 'static) -> Self {
        self.respond = Box::new(f);
        self
    }

    fn delay(mut self, f: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Box::new(f);
        self
    }

    fn attempts_for(&self, label: &str) -> usize {
        self.attempts.lock().unwrap().get(label).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, text: &str, _style: SummaryStyle) -> Result<String> {
        let label = first_line(text).to_string();
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(label).or_insert(0);
            *count += 1;
            *count
        };
        self.received.lock().unwrap().push(text.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = (self.delay)(text);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        (self.respond)(text, attempt)
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// "Part N" chunks echo their heading; anything else is a consolidation
fn echo(text: &str) -> Result<String> {
    let first = first_line(text);
    if first.starts_with("Part") {
        Ok(format!("summary of {}", first))
    } else {
        Ok(format!("merged {} summaries", text.matches("summary of").count()))
    }
}

fn sections_text(parts: usize) -> String {
    (1..=parts)
        .map(|i| format!("Part {}\n{}", i, "This sentence fills the section. ".repeat(10).trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn structure(text: &str) -> StructuredData {
    StructuralAnalyzer::default().structure(text)
}

fn test_config() -> OrchestratorConfig {
    OrchestratorConfig { backoff_base: Duration::from_millis(100), ..Default::default() }
}

async fn orchestrator(
    summarizer: &Arc<ScriptedSummarizer>,
    daily_cap: u32,
    config: OrchestratorConfig,
) -> RequestOrchestrator {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap());
    let quota = QuotaTracker::load(daily_cap, Arc::new(clock), Arc::new(MemoryKeyValueStore::new()))
        .await
        .unwrap();
    RequestOrchestrator::new(summarizer.clone(), Arc::new(quota), config)
}

#[tokio::test]
async fn test_single_plan_sends_one_request() {
    let summarizer = Arc::new(ScriptedSummarizer::new());
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(1);

    let summary = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::single(), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(summary.text, "summary of Part 1");
    assert_eq!(summary.requests_used, 1);
    assert_eq!(summary.chunk_summaries.len(), 1);
    assert!(!summary.consolidated);
    assert_eq!(summarizer.total_calls(), 1);
    assert_eq!(orchestrator.quota().status().requests_used, 1);
}

#[tokio::test]
async fn test_dual_plan_consolidates() {
    let summarizer = Arc::new(ScriptedSummarizer::new());
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(2);

    let mut states = Vec::new();
    let summary = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::dual(), SummaryStyle::Detailed, &CancelToken::new(), |p| {
            states.push(p.state)
        })
        .await
        .unwrap();

    assert_eq!(summary.text, "merged 2 summaries");
    assert!(summary.consolidated);
    assert_eq!(summary.requests_used, 3);
    assert_eq!(summary.chunk_summaries[0].text, "summary of Part 1");
    assert_eq!(summary.chunk_summaries[1].text, "summary of Part 2");
    assert_eq!(orchestrator.quota().status().requests_used, 3);

    assert_eq!(states.first(), Some(&PipelineState::Dispatching));
    assert!(states.contains(&PipelineState::Aggregating));
    assert_eq!(states.last(), Some(&PipelineState::Complete));
}

#[tokio::test(start_paused = true)]
async fn test_results_follow_source_order() {
    // Earlier parts finish last
    let summarizer = Arc::new(ScriptedSummarizer::new().delay(|text| {
        let part: u64 = first_line(text).trim_start_matches("Part ").parse().unwrap_or(0);
        Duration::from_millis((10 - part) * 100)
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(5);

    let summary = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(5), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    let expected: Vec<String> = (1..=5).map(|i| format!("summary of Part {}", i)).collect();
    assert_eq!(summary.text, expected.join("\n\n"));
    let indices: Vec<usize> = summary.chunk_summaries.iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(summary.requests_used, 5);
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_requests_are_bounded() {
    let summarizer =
        Arc::new(ScriptedSummarizer::new().delay(|_| Duration::from_millis(50)));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(6);

    orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(6), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(summarizer.peak.load(Ordering::SeqCst), 2);
    assert_eq!(summarizer.total_calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_failed_chunk_keeps_partial_summary() {
    let summarizer = Arc::new(ScriptedSummarizer::new().respond(|text, _| {
        if first_line(text) == "Part 2" {
            Err(AppError::network("connection reset"))
        } else {
            echo(text)
        }
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(3);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(3), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    let OrchestrationError::Failed { error, partial } = err else {
        panic!("expected a failed run");
    };
    assert!(matches!(error, AppError::Server { .. }), "unexpected error: {:?}", error);

    let partial = partial.expect("partial summary attached");
    assert_eq!(partial.text, "summary of Part 1\n\nsummary of Part 3");
    assert_eq!(partial.missing_chunks, vec![1]);
    assert_eq!(partial.total_chunks, 3);

    assert_eq!(summarizer.attempts_for("Part 2"), 3);
    // Only completed requests are charged
    assert_eq!(orchestrator.quota().status().requests_used, 2);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_retried() {
    let summarizer = Arc::new(ScriptedSummarizer::new().respond(|text, attempt| {
        if attempt < 3 {
            Err(AppError::ModelLoading { message: "warming up".to_string() })
        } else {
            echo(text)
        }
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(1);

    let started = tokio::time::Instant::now();
    let summary = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::single(), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(summary.text, "summary of Part 1");
    assert_eq!(summarizer.attempts_for("Part 1"), 3);
    // 100ms then 200ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(orchestrator.quota().status().requests_used, 1);
}

#[tokio::test]
async fn test_non_transient_failure_stops_dispatch() {
    let summarizer = Arc::new(ScriptedSummarizer::new().respond(|text, _| {
        if first_line(text) == "Part 1" {
            Err(AppError::InvalidApiKey { message: "revoked".to_string() })
        } else {
            echo(text)
        }
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(5);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(5), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert_eq!(
        err.app_error(),
        Some(&AppError::InvalidApiKey { message: "revoked".to_string() })
    );
    assert_eq!(summarizer.attempts_for("Part 1"), 1);
    assert!(summarizer.total_calls() <= 2);
}

#[tokio::test(start_paused = true)]
async fn test_quota_exhaustion_mid_run() {
    let summarizer =
        Arc::new(ScriptedSummarizer::new().delay(|_| Duration::from_millis(10)));
    let orchestrator = orchestrator(&summarizer, 2, test_config()).await;
    let text = sections_text(3);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(3), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err.app_error(), Some(AppError::RateLimit { .. })));
    assert_eq!(err.partial().map(|p| p.completed.len()), Some(2));
    assert_eq!(summarizer.attempts_for("Part 3"), 0);
    assert_eq!(orchestrator.quota().status().requests_used, 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_network_error() {
    let summarizer = Arc::new(ScriptedSummarizer::new().delay(|_| Duration::from_secs(60)));
    let config = OrchestratorConfig { max_attempts: 2, ..test_config() };
    let orchestrator = orchestrator(&summarizer, 50, config).await;
    let text = sections_text(1);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::single(), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.app_error(), Some(&AppError::network("Request timed out after 30s")));
    assert!(err.partial().is_none());
    assert_eq!(summarizer.attempts_for("Part 1"), 2);
    assert_eq!(orchestrator.quota().status().requests_used, 0);
}

#[tokio::test(start_paused = true)]
async fn test_offline_backend_surfaces_network_error() {
    let summarizer = Arc::new(
        ScriptedSummarizer::new().respond(|_, _| Err(AppError::network("connection refused"))),
    );
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(1);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::single(), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    let error = err.app_error().unwrap();
    assert_eq!(error, &AppError::network("connection refused"));
    assert_eq!(error.code(), "network_error");
    assert_eq!(summarizer.attempts_for("Part 1"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_every_chunk_failing_alike_keeps_variant() {
    let summarizer = Arc::new(ScriptedSummarizer::new().respond(|_, _| {
        Err(AppError::ModelLoading { message: "model is loading".to_string() })
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(3);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(3), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err.app_error(), Some(AppError::ModelLoading { .. })), "{:?}", err);
    assert!(err.partial().is_none());
}

#[tokio::test]
async fn test_cancelled_before_dispatch() {
    let summarizer = Arc::new(ScriptedSummarizer::new());
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(3);
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(3), SummaryStyle::Brief, &cancel, |_| {})
        .await
        .unwrap_err();

    assert_eq!(err, OrchestrationError::Cancelled { drained: 0 });
    assert_eq!(summarizer.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_drains_in_flight_requests() {
    let summarizer = Arc::new(ScriptedSummarizer::new().delay(|text| {
        if first_line(text) == "Part 1" {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(100)
        }
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(4);
    let cancel = CancelToken::new();

    let token = cancel.clone();
    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(4), SummaryStyle::Brief, &cancel, move |p| {
            if p.state == PipelineState::Dispatching && p.current == 1 {
                token.cancel();
            }
        })
        .await
        .unwrap_err();

    // Part 1 finished before the cancel; only Part 2 was drained
    assert_eq!(err, OrchestrationError::Cancelled { drained: 1 });
    assert_eq!(summarizer.total_calls(), 2);
    // Drained requests still count against the quota
    assert_eq!(orchestrator.quota().status().requests_used, 2);
}

#[tokio::test]
async fn test_cancel_after_last_chunk_keeps_summary() {
    let summarizer = Arc::new(ScriptedSummarizer::new());
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(2);
    let cancel = CancelToken::new();

    let token = cancel.clone();
    let summary = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::multi(2), SummaryStyle::Brief, &cancel, move |p| {
            if p.state == PipelineState::Dispatching && p.current == 2 {
                token.cancel();
            }
        })
        .await
        .unwrap();

    assert_eq!(summary.text, "summary of Part 1\n\nsummary of Part 2");
    assert_eq!(summary.requests_used, 2);
}

#[tokio::test]
async fn test_consolidation_failure_keeps_chunk_summaries() {
    let summarizer = Arc::new(ScriptedSummarizer::new().respond(|text, _| {
        if first_line(text).starts_with("Part") {
            echo(text)
        } else {
            Err(AppError::invalid_input("prompt too long"))
        }
    }));
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = sections_text(2);

    let err = orchestrator
        .execute(&text, &structure(&text), &ExecutionPlan::dual(), SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap_err();

    assert_eq!(err.app_error(), Some(&AppError::invalid_input("prompt too long")));
    let partial = err.partial().unwrap();
    assert_eq!(partial.text, "summary of Part 1\n\nsummary of Part 2");
    assert!(partial.missing_chunks.is_empty());
}

#[tokio::test]
async fn test_input_limit_truncates_at_sentence() {
    let summarizer = Arc::new(ScriptedSummarizer::new());
    let orchestrator = orchestrator(&summarizer, 50, test_config()).await;
    let text = format!("Part 1\n{}", "This sentence fills the section. ".repeat(1300));
    let plan = ExecutionPlan { input_limit: Some(30_000), ..ExecutionPlan::single() };

    orchestrator
        .execute(&text, &structure(&text), &plan, SummaryStyle::Brief, &CancelToken::new(), |_| {})
        .await
        .unwrap();

    let received = summarizer.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].chars().count() <= 30_000);
    assert!(received[0].ends_with("section."));
}
