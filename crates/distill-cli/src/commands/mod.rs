//! Command implementations

mod analyze;
mod config;
mod draft;
mod plan;
mod quota;
mod summarize;

use crate::cli::{Cli, Commands, InputArgs};
use crate::errors;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use distill_core::clock::SystemClock;
use distill_core::config::{CliConfigOverrides, LayeredConfig};
use distill_core::models::Document;
use distill_engine::{DraftManager, SummaryPipeline};
use distill_store::{JsonFileStore, KeyValueStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);

    let mut overrides = CliConfigOverrides {
        daily_cap: cli.daily_cap,
        summarizer: cli.summarizer.clone(),
        ..Default::default()
    };
    if let Commands::Summarize(args) = &cli.command {
        overrides.max_in_flight = args.max_in_flight;
        overrides.chunk_boundary = args.boundary;
    }

    let context = AppContext::load(cli.data_dir, cli.config, overrides)?;

    match cli.command {
        Commands::Analyze(args) => analyze::execute(args, &context, &output).await,
        Commands::Plan(args) => plan::execute(args, &context, &output).await,
        Commands::Summarize(args) => summarize::execute(args, &context, &output).await,
        Commands::Quota => quota::execute(&context, &output).await,
        Commands::Draft(args) => draft::execute(args, &context, &output).await,
        Commands::Config => config::execute(&context, &output),
    }
}

/// State shared by every command
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config_path: Option<PathBuf>,
    pub config: LayeredConfig,
    pub store: Arc<JsonFileStore>,
}

impl AppContext {
    fn load(
        data_dir: Option<PathBuf>,
        config_path: Option<PathBuf>,
        overrides: CliConfigOverrides,
    ) -> Result<Self> {
        let data_dir = crate::config::resolve_data_dir(data_dir.as_deref());
        let config = crate::config::load_config(&data_dir, config_path.as_deref(), overrides)?;
        let store = Arc::new(JsonFileStore::new(data_dir.join("store")));
        tracing::debug!(data_dir = %data_dir.display(), "Loaded configuration");

        Ok(Self { data_dir, config_path, config, store })
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    pub async fn pipeline(&self) -> Result<SummaryPipeline> {
        let pipeline = SummaryPipeline::from_config(&self.config, self.store())
            .await
            .context("Failed to initialize the summarization pipeline")?;
        Ok(pipeline)
    }

    pub fn drafts(&self) -> DraftManager {
        DraftManager::new(
            self.store(),
            Arc::new(SystemClock),
            Duration::from_millis(self.config.debounce_ms.value),
        )
    }
}

/// Resolve the command input into a document
pub async fn load_document(input: &InputArgs, context: &AppContext) -> Result<Document> {
    if let Some(text) = &input.text {
        return Ok(Document::from_text(text.clone()));
    }

    if let Some(kind) = input.draft {
        let draft = context.drafts().load(kind).await?;
        return match draft {
            Some(draft) => Ok(Document::from_text(draft.content)),
            None => Err(errors::draft_not_found(kind.tag()).into()),
        };
    }

    match &input.path {
        Some(path) if !path.exists() => {
            Err(errors::document_not_found(&path.display().to_string()).into())
        }
        Some(path) => Ok(Document::from_path(path)?),
        None => Err(errors::CliError::new("No input given")
            .with_code("invalid_input")
            .with_suggestion("Pass a file path, --text, or --draft")
            .into()),
    }
}
