//! Distill CLI - Command-line interface
//!
//! This is the main CLI adapter for the Distill summarization engine.

mod cli;
mod commands;
mod config;
mod errors;
mod interactive;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so JSON output on stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let json = cli.json;

    // Create async runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Execute the command
    if let Err(error) = runtime.block_on(commands::execute(cli)) {
        let error = errors::from_anyhow(error);
        if json {
            error.display_json();
        } else {
            error.display();
        }
        std::process::exit(error.exit_code());
    }

    Ok(())
}
