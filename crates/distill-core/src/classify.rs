//! Error classification
//!
//! Maps raw failures from transports, extractors and storage into the closed
//! [`AppError`] taxonomy. Every raw failure maps to exactly one variant, and
//! `Unknown` always carries the original diagnostic text.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use std::io;
use std::time::Duration;

/// A failure as observed at a component boundary, before classification
#[derive(Debug)]
pub enum RawFailure {
    /// The request did not complete within its deadline
    Timeout { after: Duration },

    /// Connection could not be established or was dropped
    Connection { message: String },

    /// The backend answered with a non-success HTTP status
    HttpStatus { status: u16, body: String },

    /// A document reader failed
    Extraction { format: String, message: String },

    /// Optical character recognition failed or is unavailable
    Ocr { message: String },

    /// A key-value store read or write failed
    Storage(io::Error),

    /// The backend requires credentials that are not configured
    MissingCredentials,

    /// The daily quota rejected the request
    QuotaExhausted { reset_at: DateTime<Utc> },

    /// Anything else, described by its message
    Other { message: String },
}

/// Classify a raw failure into the application taxonomy
pub fn classify(failure: RawFailure) -> AppError {
    match failure {
        RawFailure::Timeout { after } => {
            AppError::network(format!("Request timed out after {}s", after.as_secs()))
        }
        RawFailure::Connection { message } => AppError::network(message),
        RawFailure::HttpStatus { status, body } => classify_http_status(status, &body),
        RawFailure::Extraction { format, message } => classify_extraction(&format, &message),
        RawFailure::Ocr { message } => AppError::OcrFailed { reason: message },
        RawFailure::Storage(err) => classify_io(&err),
        RawFailure::MissingCredentials => AppError::ApiKey,
        RawFailure::QuotaExhausted { reset_at } => AppError::RateLimit { reset_at },
        RawFailure::Other { message } => classify_message(&message),
    }
}

/// Classify a non-success HTTP response from the summarization backend
pub fn classify_http_status(status: u16, body: &str) -> AppError {
    let lowered = body.to_lowercase();
    match status {
        401 | 403 => AppError::InvalidApiKey { message: truncate(body, 200) },
        400 | 413 | 422 => AppError::InvalidInput { reason: truncate(body, 200) },
        503 if lowered.contains("loading") => AppError::ModelLoading { message: truncate(body, 200) },
        408 | 504 => AppError::network(format!("Gateway timeout ({})", status)),
        // Backend-side throttling is transient; the daily quota is tracked locally
        429 | 500..=599 => AppError::Server { status: Some(status), message: truncate(body, 200) },
        _ => AppError::unknown(format!("HTTP {}: {}", status, truncate(body, 200))),
    }
}

/// Classify an I/O failure from a persistence backend
pub fn classify_io(err: &io::Error) -> AppError {
    // ENOSPC / ERROR_DISK_FULL
    let out_of_space = err.kind() == io::ErrorKind::StorageFull
        || matches!(err.raw_os_error(), Some(28) | Some(112));

    if out_of_space {
        AppError::StorageFull { reason: err.to_string() }
    } else {
        match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                AppError::invalid_input(err.to_string())
            }
            _ => AppError::unknown(err.to_string()),
        }
    }
}

fn classify_extraction(format: &str, message: &str) -> AppError {
    let lowered = message.to_lowercase();
    if lowered.contains("password") || lowered.contains("encrypt") {
        AppError::invalid_input(format!("{} document is password protected", format))
    } else if format.eq_ignore_ascii_case("image") || format.eq_ignore_ascii_case("ocr") {
        AppError::OcrFailed { reason: message.to_string() }
    } else {
        AppError::invalid_input(format!("Failed to read {}: {}", format, message))
    }
}

/// Last-resort classification from a free-form message
pub fn classify_message(message: &str) -> AppError {
    let lowered = message.to_lowercase();

    if lowered.contains("timed out") || lowered.contains("connection") || lowered.contains("dns") {
        AppError::network(message)
    } else if lowered.contains("no space") || lowered.contains("disk full") {
        AppError::StorageFull { reason: message.to_string() }
    } else if lowered.contains("api key") || lowered.contains("unauthorized") {
        AppError::InvalidApiKey { message: message.to_string() }
    } else if lowered.contains("loading") && lowered.contains("model") {
        AppError::ModelLoading { message: message.to_string() }
    } else {
        AppError::unknown(message)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        classify_io(&err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::invalid_input(format!("Malformed payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_auth_failures() {
        assert!(matches!(classify_http_status(401, "bad key"), AppError::InvalidApiKey { .. }));
        assert!(matches!(classify_http_status(403, ""), AppError::InvalidApiKey { .. }));
    }

    #[test]
    fn test_http_model_loading() {
        let err = classify_http_status(503, r#"{"error":"Model is currently loading"}"#);
        assert!(matches!(err, AppError::ModelLoading { .. }));

        let err = classify_http_status(503, "upstream unavailable");
        assert_eq!(err, AppError::Server { status: Some(503), message: "upstream unavailable".into() });
    }

    #[test]
    fn test_http_unmapped_status_keeps_diagnostics() {
        let err = classify_http_status(418, "teapot");
        match err {
            AppError::Unknown { original } => assert!(original.contains("418") && original.contains("teapot")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_timeout_is_network() {
        let err = classify(RawFailure::Timeout { after: Duration::from_secs(30) });
        assert_eq!(err, AppError::network("Request timed out after 30s"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_storage_full() {
        let err = classify(RawFailure::Storage(io::Error::from_raw_os_error(28)));
        assert!(matches!(err, AppError::StorageFull { .. }));

        let err = classify(RawFailure::Storage(io::Error::new(io::ErrorKind::PermissionDenied, "ro")));
        assert!(matches!(err, AppError::Unknown { .. }));
    }

    #[test]
    fn test_extraction_password() {
        let err = classify(RawFailure::Extraction {
            format: "PDF".into(),
            message: "document is encrypted".into(),
        });
        assert_eq!(err, AppError::invalid_input("PDF document is password protected"));
    }

    #[test]
    fn test_missing_credentials_and_quota() {
        assert_eq!(classify(RawFailure::MissingCredentials), AppError::ApiKey);

        let reset_at = Utc::now();
        assert_eq!(classify(RawFailure::QuotaExhausted { reset_at }), AppError::RateLimit { reset_at });
    }

    #[test]
    fn test_message_fallback() {
        assert!(matches!(classify_message("connection refused"), AppError::Network { .. }));
        assert!(matches!(classify_message("No space left on device"), AppError::StorageFull { .. }));
        assert_eq!(classify_message("weird"), AppError::unknown("weird"));
    }

    #[test]
    fn test_truncate_long_bodies() {
        let body = "x".repeat(500);
        match classify_http_status(500, &body) {
            AppError::Server { message, .. } => assert_eq!(message.chars().count(), 201),
            other => panic!("unexpected {:?}", other),
        }
    }
}
