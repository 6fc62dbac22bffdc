//! Offline extractive summarizer
//!
//! Picks leading sentences instead of generating text. Useful without a
//! model server and as a deterministic backend in tests.

use async_trait::async_trait;
use distill_core::error::{AppError, Result};

use crate::ports::{Summarizer, SummaryStyle};

/// Extractive summarizer built on sentence selection
#[derive(Debug, Clone, Default)]
pub struct ExtractiveSummarizer;

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self
    }

    fn sentence_budget(style: SummaryStyle) -> usize {
        match style {
            SummaryStyle::Brief => 3,
            SummaryStyle::Detailed => 8,
            SummaryStyle::KeyPoints => 5,
        }
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, text: &str, style: SummaryStyle) -> Result<String> {
        let sentences: Vec<String> = split_sentences(text)
            .into_iter()
            .take(Self::sentence_budget(style))
            .collect();

        if sentences.is_empty() {
            return Err(AppError::invalid_input("Nothing to summarize"));
        }

        Ok(match style {
            SummaryStyle::KeyPoints => {
                sentences.iter().map(|s| format!("- {}", s)).collect::<Vec<_>>().join("\n")
            }
            _ => sentences.join(" "),
        })
    }

    fn name(&self) -> String {
        "extractive".to_string()
    }
}

/// Split on sentence terminators followed by whitespace, normalizing spacing
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();

    for word in text.split_whitespace() {
        current.push(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        sentences.push(current.join(" "));
    }
    sentences
}
