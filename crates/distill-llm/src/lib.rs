//! Distill LLM - Summarization backend port and adapters
//!
//! This crate defines the `Summarizer` port the engine dispatches requests
//! through, along with an Ollama HTTP adapter and an offline extractive one.

pub mod extractive;
pub mod ollama;
pub mod ports;

// Re-export main types
pub use extractive::ExtractiveSummarizer;
pub use ollama::OllamaSummarizer;
pub use ports::{Summarizer, SummaryStyle};

use distill_core::config::LayeredConfig;
use distill_core::error::{AppError, Result};
use std::sync::Arc;

/// Build the summarizer named by the `provider:model` config value
pub fn summarizer_from_config(config: &LayeredConfig) -> Result<Arc<dyn Summarizer>> {
    let spec = config.summarizer.value.as_str();
    let provider = spec.split_once(':').map_or(spec, |(provider, _)| provider);

    match provider {
        "ollama" => {
            let mut summarizer =
                OllamaSummarizer::new(config.summarizer_url.value.clone(), config.summarizer_model());
            if let Some(key) = &config.api_key {
                summarizer = summarizer.with_api_key(key.clone());
            }
            if config.require_api_key.value {
                summarizer = summarizer.require_api_key();
            }
            Ok(Arc::new(summarizer))
        }
        "extractive" => Ok(Arc::new(ExtractiveSummarizer::new())),
        other => Err(AppError::invalid_input(format!(
            "Unknown summarizer provider '{}'. Use ollama:<model> or extractive",
            other
        ))),
    }
}
