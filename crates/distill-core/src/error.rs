//! Error taxonomy for Distill
//!
//! `AppError` is the closed set of failures every component terminates in.
//! Callers match on it exhaustively; the core never retries terminal variants.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // Transport errors
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Server error{}: {message}", status_suffix(.status))]
    Server { status: Option<u16>, message: String },

    #[error("Model is still loading: {message}")]
    ModelLoading { message: String },

    // Quota errors
    #[error("Daily request limit reached, resets at {reset_at}")]
    RateLimit { reset_at: DateTime<Utc> },

    // Input errors
    #[error("Text too short: {actual} characters (minimum {min})")]
    TextTooShort { min: usize, actual: usize },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Text recognition failed: {reason}")]
    OcrFailed { reason: String },

    // Storage errors
    #[error("Storage full: {reason}")]
    StorageFull { reason: String },

    // Credential errors
    #[error("No API key configured")]
    ApiKey,

    #[error("API key rejected: {message}")]
    InvalidApiKey { message: String },

    #[error("Unexpected error: {original}")]
    Unknown { original: String },
}

impl AppError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server { status: None, message: message.into() }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    pub fn unknown(original: impl Into<String>) -> Self {
        Self::Unknown { original: original.into() }
    }

    /// Failures that may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Server { .. } | Self::ModelLoading { .. })
    }

    /// Whether the orchestrator may retry this failure on its own.
    ///
    /// Rate limiting is advisory and never retried automatically.
    pub fn is_retryable(&self) -> bool {
        self.is_transient()
    }

    /// Stable machine-readable identifier
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Server { .. } => "server_error",
            Self::ModelLoading { .. } => "model_loading",
            Self::RateLimit { .. } => "rate_limit",
            Self::TextTooShort { .. } => "text_too_short",
            Self::InvalidInput { .. } => "invalid_input",
            Self::OcrFailed { .. } => "ocr_failed",
            Self::StorageFull { .. } => "storage_full",
            Self::ApiKey => "api_key_missing",
            Self::InvalidApiKey { .. } => "api_key_invalid",
            Self::Unknown { .. } => "unknown_error",
        }
    }

    /// Short, actionable hint for presenting the error to a user
    pub fn remediation(&self) -> String {
        match self {
            Self::Network { .. } => "Check your connection and try again.".to_string(),
            Self::Server { .. } => "The summarization service failed. Try again later.".to_string(),
            Self::ModelLoading { .. } => {
                "The model is warming up. Wait a moment and retry.".to_string()
            }
            Self::RateLimit { reset_at } => {
                format!("Wait until {} or choose a cheaper strategy.", reset_at.format("%Y-%m-%d %H:%M UTC"))
            }
            Self::TextTooShort { min, .. } => format!("Provide at least {} characters.", min),
            Self::InvalidInput { .. } => "Check the document and try again.".to_string(),
            Self::OcrFailed { .. } => "Retake the photo with better lighting and focus.".to_string(),
            Self::StorageFull { .. } => "Free up storage space.".to_string(),
            Self::ApiKey => "Set DISTILL_API_KEY before summarizing.".to_string(),
            Self::InvalidApiKey { .. } => "Replace the configured API key.".to_string(),
            Self::Unknown { original } => format!("Unexpected failure: {}", original),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, AppError>;
