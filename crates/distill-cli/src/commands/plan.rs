//! Plan command implementation

use super::{load_document, AppContext};
use crate::cli::PlanArgs;
use crate::output::OutputWriter;
use crate::output_types::{OptionRow, PlanOutput};
use crate::progress::SummaryProgress;
use anyhow::Result;

pub async fn execute(args: PlanArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let document = load_document(&args.input, context).await?;
    let pipeline = context.pipeline().await?;

    let mut progress = SummaryProgress::new(output.is_json());
    let prepared = pipeline.prepare(document, |event| progress.update(event)).await;
    progress.clear();
    let prepared = prepared?;

    if output.is_json() {
        output.result(PlanOutput {
            document: prepared.document.name(),
            characters: prepared.char_count(),
            options: prepared.options.clone(),
            quota: prepared.quota.into(),
        })?;
        return Ok(());
    }

    output.section(format!("Processing options for {}", prepared.document.name()));
    output.kv("Characters", prepared.char_count());
    output.kv(
        "Quota",
        format!(
            "{} of {} requests left today",
            prepared.quota.remaining(),
            prepared.quota.daily_cap
        ),
    );
    output.table(prepared.options.iter().map(OptionRow::from).collect());

    if prepared.options.iter().any(|o| o.quota_constrained) {
        output.warning("The full strategy does not fit today's quota; a reduced option is offered");
    }

    Ok(())
}
