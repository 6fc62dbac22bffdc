use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use distill_core::models::InputKind;
use distill_core::processing::ChunkBoundary;
use distill_llm::SummaryStyle;
use std::path::PathBuf;

/// Distill - Quota-aware document summarization
#[derive(Parser, Debug)]
#[command(name = "distill")]
#[command(about = "Quota-aware document summarization", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory holding quota state, drafts and config.toml
    /// (defaults to $DISTILL_DATA_DIR or ./.distill)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file (defaults to <data-dir>/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Summarizer to use (e.g., "ollama:llama3.2" or "extractive")
    #[arg(long, global = true)]
    pub summarizer: Option<String>,

    /// Override the daily request cap
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub daily_cap: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract and analyze a document's structure
    Analyze(AnalyzeArgs),

    /// Show the processing options for a document under today's quota
    Plan(PlanArgs),

    /// Summarize a document
    Summarize(SummarizeArgs),

    /// Show today's request quota
    Quota,

    /// Manage saved drafts
    Draft(DraftArgs),

    /// Show the effective configuration and where each value comes from
    Config,
}

/// Where the input text comes from.
///
/// All three are optional at parse time: `summarize -i` may start with no
/// input and offer the saved draft. A command left without input fails
/// with `invalid_input` when the document is loaded.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Document to read (.txt, .md, .pdf, .docx, or an image scan)
    pub path: Option<PathBuf>,

    /// Use literal text instead of a file
    #[arg(long, conflicts_with = "path")]
    pub text: Option<String>,

    /// Use the saved draft for an input kind (text, scan, or document)
    #[arg(long, value_name = "KIND", conflicts_with_all = ["path", "text"])]
    pub draft: Option<InputKind>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also list every detected section
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Summary style (brief, detailed, or key-points)
    #[arg(long, default_value = "brief")]
    pub style: SummaryStyle,

    /// Preferred chunk boundary (section, paragraph, or sentence)
    #[arg(long, value_parser = parse_boundary)]
    pub boundary: Option<ChunkBoundary>,

    /// Maximum chunk requests in flight
    #[arg(long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub max_in_flight: Option<usize>,

    /// Proceed with a quota-constrained option without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Interactive mode - confirm the plan and offer draft recovery
    #[arg(long, short = 'i')]
    pub interactive: bool,

    /// Save the input as a draft before summarizing
    #[arg(long, value_name = "KIND")]
    pub save_draft: Option<InputKind>,
}

#[derive(Args, Debug)]
pub struct DraftArgs {
    #[command(subcommand)]
    pub command: DraftCommand,
}

#[derive(Subcommand, Debug)]
pub enum DraftCommand {
    /// Save text as the draft for an input kind
    Save(DraftSaveArgs),

    /// Show the saved draft for an input kind
    Show(DraftKindArgs),

    /// Delete the saved draft for an input kind
    Clear(DraftKindArgs),
}

#[derive(Args, Debug)]
pub struct DraftSaveArgs {
    /// Input kind (text, scan, or document)
    pub kind: InputKind,

    /// Draft content
    #[arg(long, required_unless_present = "file")]
    pub text: Option<String>,

    /// Read draft content from a file
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DraftKindArgs {
    /// Input kind (text, scan, or document)
    pub kind: InputKind,
}

fn parse_boundary(s: &str) -> Result<ChunkBoundary, String> {
    distill_core::config::parse_chunk_boundary(s).map_err(|e| e.to_string())
}
