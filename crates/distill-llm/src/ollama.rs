use async_trait::async_trait;
use distill_core::classify::{classify, RawFailure};
use distill_core::error::{AppError, Result};
use serde::{Deserialize, Serialize};

use crate::ports::{Summarizer, SummaryStyle};

/// Ollama summarizer implementation
pub struct OllamaSummarizer {
    /// Base URL for Ollama API (e.g., "http://localhost:11434")
    base_url: String,

    /// Model name to generate with
    model: String,

    /// Bearer token for hosted, authenticated deployments
    api_key: Option<String>,

    /// Refuse to send requests without an API key
    api_key_required: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaSummarizer {
    /// Create a new Ollama summarizer
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            api_key_required: false,
            client: reqwest::Client::new(),
        }
    }

    /// Create with default localhost URL
    pub fn localhost(model: impl Into<String>) -> Self {
        Self::new("http://localhost:11434", model)
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn require_api_key(mut self) -> Self {
        self.api_key_required = true;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn prompt(&self, text: &str, style: SummaryStyle) -> String {
        format!("{}\n\n{}", style.instruction(), text)
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str, style: SummaryStyle) -> Result<String> {
        if self.api_key_required && self.api_key.is_none() {
            return Err(classify(RawFailure::MissingCredentials));
        }

        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt: self.prompt(text, style),
            stream: false,
        };

        let mut builder = self.client.post(format!("{}/api/generate", self.base_url)).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(model = %self.model, chars = text.len(), %style, "Sending summarization request");

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::network(format!("Request to {} timed out", self.base_url))
            } else if e.is_connect() {
                classify(RawFailure::Connection {
                    message: format!("Failed to connect to Ollama at {}: {}", self.base_url, e),
                })
            } else {
                classify(RawFailure::Other { message: e.to_string() })
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(RawFailure::HttpStatus { status: status.as_u16(), body }));
        }

        let generated: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::server(format!("Failed to parse Ollama response: {}", e)))?;

        let summary = generated.response.trim().to_string();
        if summary.is_empty() {
            return Err(AppError::server("Ollama returned an empty summary"));
        }
        Ok(summary)
    }

    fn name(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}
