//! Draft command implementation

use super::AppContext;
use crate::cli::{DraftArgs, DraftCommand, DraftKindArgs, DraftSaveArgs};
use crate::errors::{self, CliError};
use crate::output::OutputWriter;
use crate::output_types::DraftOutput;
use anyhow::{Context, Result};
use distill_engine::SaveStatus;

pub async fn execute(args: DraftArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    match args.command {
        DraftCommand::Save(args) => save(args, context, output).await,
        DraftCommand::Show(args) => show(args, context, output).await,
        DraftCommand::Clear(args) => clear(args, context, output).await,
    }
}

async fn save(args: DraftSaveArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let content = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let drafts = context.drafts();
    drafts.on_input_changed(args.kind, content.clone());

    match drafts.flush(args.kind).await {
        SaveStatus::Saved { at } => {
            if output.is_json() {
                let stored = !content.trim().is_empty();
                output.result(DraftOutput {
                    kind: args.kind.to_string(),
                    content: stored.then_some(content),
                    modified_at: stored.then_some(at),
                })?;
            } else {
                output.success(format!("Saved {} draft", args.kind));
            }
            Ok(())
        }
        SaveStatus::Failed { error } => Err(errors::from_app_error(&error).into()),
        status => Err(CliError::new(format!("Draft was not saved ({:?})", status)).into()),
    }
}

async fn show(args: DraftKindArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let draft = context.drafts().load(args.kind).await?;
    let Some(draft) = draft else {
        return Err(errors::draft_not_found(args.kind.tag()).into());
    };

    if output.is_json() {
        output.result(DraftOutput {
            kind: draft.kind.to_string(),
            content: Some(draft.content),
            modified_at: Some(draft.modified_at),
        })?;
    } else {
        output.section(format!("{} draft", draft.kind));
        output.kv("Saved", draft.modified_at.format("%Y-%m-%d %H:%M:%S UTC"));
        output.text("");
        output.text(&draft.content);
    }
    Ok(())
}

async fn clear(args: DraftKindArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let drafts = context.drafts();
    drafts.clear(args.kind).await;

    if let SaveStatus::Failed { error } = drafts.status().borrow().clone() {
        return Err(errors::from_app_error(&error).into());
    }

    if output.is_json() {
        output.result(DraftOutput { kind: args.kind.to_string(), content: None, modified_at: None })?;
    } else {
        output.success(format!("Cleared {} draft", args.kind));
    }
    Ok(())
}
