//! Quota command implementation

use super::AppContext;
use crate::output::OutputWriter;
use crate::output_types::QuotaOutput;
use anyhow::{Context, Result};
use console::style;
use distill_core::clock::SystemClock;
use distill_engine::QuotaTracker;
use std::sync::Arc;

pub async fn execute(context: &AppContext, output: &OutputWriter) -> Result<()> {
    let tracker = QuotaTracker::load(context.config.daily_cap.value, Arc::new(SystemClock), context.store())
        .await
        .context("Failed to read quota state")?;
    let status = tracker.status();

    if output.is_json() {
        output.result(QuotaOutput::from(status))?;
        return Ok(());
    }

    output.section("Daily Quota");
    output.kv("Used", format!("{} / {}", status.requests_used, status.daily_cap));
    output.kv("Remaining", status.remaining());
    output.kv("Resets", status.reset_at.format("%Y-%m-%d %H:%M UTC"));

    if status.is_over_limit() {
        output.text(format!("\n{}", style("Limit reached. New requests wait for the reset.").red().bold()));
    } else if status.is_near_limit() {
        output.warning("Nearly out of requests for today");
    }

    Ok(())
}
