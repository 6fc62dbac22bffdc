use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Input context a draft belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Typed or pasted text
    Text,
    /// Text recognized from a camera scan, possibly edited
    Scan,
    /// Text taken from an uploaded document, possibly edited
    Document,
}

impl InputKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Scan => "scan",
            Self::Document => "document",
        }
    }

    /// Store key holding the draft for this input context
    pub fn storage_key(&self) -> String {
        format!("draft/{}", self.tag())
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for InputKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "scan" => Ok(Self::Scan),
            "document" | "doc" => Ok(Self::Document),
            _ => Err(format!("Invalid input kind: {}. Use text, scan, or document", s)),
        }
    }
}

/// Most recently auto-saved snapshot of unsent user input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub content: String,
    pub kind: InputKind,
    pub modified_at: DateTime<Utc>,
}
