//! Summarize command implementation

use super::{load_document, AppContext};
use crate::cli::{InputArgs, SummarizeArgs};
use crate::errors::CliError;
use crate::interactive;
use crate::output::OutputWriter;
use crate::output_types::SummarizeOutput;
use crate::progress::SummaryProgress;
use anyhow::Result;
use console::Term;
use distill_core::models::{Document, InputKind, ProcessingOption};
use distill_engine::{CancelToken, DraftManager, OrchestrationError, SaveStatus};

pub async fn execute(args: SummarizeArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let drafts = context.drafts();

    let document = match restore_draft(&args, &drafts).await? {
        Some(document) => {
            output.info("Continuing from the saved draft");
            document
        }
        None => load_document(&args.input, context).await?,
    };

    let pipeline = context.pipeline().await?;
    let mut progress = SummaryProgress::new(output.is_json());
    let prepared = pipeline.prepare(document, |event| progress.update(event)).await;
    progress.clear();
    let prepared = prepared?;

    if let Some(kind) = args.save_draft {
        save_draft(&drafts, kind, prepared.text(), output).await;
    }

    let option = choose_option(&prepared.options, &args, output)?;
    tracing::info!(
        strategy = %option.strategy,
        requests = option.estimated_requests,
        quota_constrained = option.quota_constrained,
        "Running summarization"
    );

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, cancelling");
                cancel.cancel();
            }
        })
    };

    let result = pipeline
        .summarize(&prepared, &option.plan(), args.style, &cancel, |event| progress.update(event))
        .await;
    interrupt.abort();
    progress.clear();

    let summary = match result {
        Ok(summary) => summary,
        Err(error) => {
            if let OrchestrationError::Failed { partial: Some(partial), .. } = &error {
                output.section("Partial summary");
                output.text(&partial.text);
                output.warning(format!("Missing parts: {:?}", partial.missing_chunks));
            }
            return Err(error.into());
        }
    };

    if let Some(kind) = args.save_draft {
        drafts.clear(kind).await;
    }

    let quota = pipeline.quota().status();
    if output.is_json() {
        output.result(SummarizeOutput {
            document: prepared.document.name(),
            summarizer: pipeline.summarizer_name(),
            strategy: summary.strategy,
            quota_constrained: option.quota_constrained,
            requests_used: summary.requests_used,
            consolidated: summary.consolidated,
            summary: summary.text,
            chunks: summary.chunk_summaries,
            quota: quota.into(),
        })?;
        return Ok(());
    }

    output.section(format!("Summary of {}", prepared.document.name()));
    output.text(&summary.text);
    output.text("");
    output.success(format!(
        "{} strategy, {} request(s) used, {} of {} left today",
        summary.strategy,
        summary.requests_used,
        quota.remaining(),
        quota.daily_cap
    ));
    if quota.is_near_limit() {
        output.warning("Daily request quota is nearly used up");
    }

    Ok(())
}

/// Offer the saved draft when the live input is empty
async fn restore_draft(args: &SummarizeArgs, drafts: &DraftManager) -> Result<Option<Document>> {
    if !args.interactive {
        return Ok(None);
    }
    let Some(live_input) = live_input(&args.input) else {
        return Ok(None);
    };

    let kind = args.save_draft.unwrap_or(InputKind::Text);
    match drafts.restore_candidate(kind, live_input).await {
        Some(draft) if interactive::confirm_restore(&draft)? => {
            Ok(Some(Document::from_text(draft.content)))
        }
        _ => Ok(None),
    }
}

/// Typed input, or empty when nothing was given. A file or draft is never
/// replaced by a restored draft.
fn live_input(input: &InputArgs) -> Option<&str> {
    match (&input.text, &input.path, input.draft) {
        (Some(text), _, _) => Some(text),
        (None, None, None) => Some(""),
        _ => None,
    }
}

async fn save_draft(drafts: &DraftManager, kind: InputKind, text: &str, output: &OutputWriter) {
    drafts.on_input_changed(kind, text);
    match drafts.flush(kind).await {
        SaveStatus::Failed { error } => {
            output.warning(format!("Could not save {} draft: {}", kind, error));
        }
        status => tracing::debug!(%kind, ?status, "Draft flushed"),
    }
}

/// Pick the option to run, asking before a quota-constrained one
fn choose_option(
    options: &[ProcessingOption],
    args: &SummarizeArgs,
    output: &OutputWriter,
) -> Result<ProcessingOption> {
    let index = if args.interactive && options.len() > 1 {
        interactive::select_option(options)?
    } else {
        options.iter().position(|o| o.recommended).unwrap_or(0)
    };
    let Some(option) = options.get(index) else {
        return Err(CliError::new("No processing option available")
            .with_code("invalid_input")
            .into());
    };

    if option.quota_constrained && !args.yes {
        let can_prompt = !output.is_json() && Term::stdout().is_term();
        if !can_prompt {
            return Err(constrained_error(option).into());
        }
        if !interactive::confirm_constrained(option)? {
            return Err(CliError::new("Summarization declined")
                .with_code("cancelled")
                .into());
        }
    }

    Ok(option.clone())
}

fn constrained_error(option: &ProcessingOption) -> CliError {
    let mut error = CliError::new(format!(
        "Only a reduced {} summary fits today's quota",
        option.strategy
    ))
    .with_code("quota_constrained")
    .with_suggestion("Re-run with --yes to accept the reduced summary")
    .with_help("Run: distill quota");
    if let Some(drawback) = option.drawbacks.first() {
        error = error.with_context(drawback.clone());
    }
    error
}
