//! Summarization backend port

use async_trait::async_trait;
use distill_core::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the backend should shape a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStyle {
    /// A few sentences
    #[default]
    Brief,
    /// Paragraph-level coverage of every section
    Detailed,
    /// A bulleted list of the main points
    KeyPoints,
}

impl SummaryStyle {
    /// Instruction sent to generative backends
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Brief => "Summarize the following text in three to five sentences.",
            Self::Detailed => {
                "Write a detailed summary of the following text, covering each section in order."
            }
            Self::KeyPoints => "List the key points of the following text as short bullet points.",
        }
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Brief => "brief",
            Self::Detailed => "detailed",
            Self::KeyPoints => "key_points",
        };
        f.write_str(name)
    }
}

impl FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "brief" => Ok(Self::Brief),
            "detailed" => Ok(Self::Detailed),
            "key_points" | "keypoints" | "bullets" => Ok(Self::KeyPoints),
            _ => Err(format!("Invalid summary style: {}. Use brief, detailed, or key-points", s)),
        }
    }
}

/// Port for the summarization backend
///
/// Implementations report failures already classified into `AppError`.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text` in the given style
    async fn summarize(&self, text: &str, style: SummaryStyle) -> Result<String>;

    /// Identifier of the backend and model (e.g. "ollama:llama3.2")
    fn name(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!("brief".parse::<SummaryStyle>().unwrap(), SummaryStyle::Brief);
        assert_eq!("Detailed".parse::<SummaryStyle>().unwrap(), SummaryStyle::Detailed);
        assert_eq!("key-points".parse::<SummaryStyle>().unwrap(), SummaryStyle::KeyPoints);
        assert!("haiku".parse::<SummaryStyle>().is_err());
    }

    #[test]
    fn test_style_display_round_trips() {
        for style in [SummaryStyle::Brief, SummaryStyle::Detailed, SummaryStyle::KeyPoints] {
            assert_eq!(style.to_string().parse::<SummaryStyle>().unwrap(), style);
        }
    }
}
