use console::style;
use distill_core::error::AppError;
use distill_engine::OrchestrationError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub code: &'static str,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
    /// Results that survived the failure, reported in JSON mode
    pub partial: Option<serde_json::Value>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: "cli_error",
            context: None,
            suggestions: Vec::new(),
            help_command: None,
            partial: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    pub fn with_partial(mut self, partial: serde_json::Value) -> Self {
        self.partial = Some(partial);
        self
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self.code {
            "rate_limit" => 2,
            "cancelled" => 130,
            _ => 1,
        }
    }

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
    }

    pub fn display_json(&self) {
        let output = serde_json::json!({
            "status": "error",
            "code": self.code,
            "message": self.message,
            "context": self.context,
            "suggestions": self.suggestions,
            "partial": self.partial,
        });
        println!("{}", output);
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Create an error for a classified engine failure
pub fn from_app_error(error: &AppError) -> CliError {
    let mut cli_error = CliError::new(error.to_string())
        .with_code(error.code())
        .with_suggestion(error.remediation());

    match error {
        AppError::Network { .. } | AppError::ModelLoading { .. } => {
            cli_error = cli_error
                .with_suggestion("Check that the summarizer is running: ollama list")
                .with_help("Run: distill config");
        }
        AppError::RateLimit { .. } => {
            cli_error = cli_error
                .with_context("Requests already sent today count against the daily cap.")
                .with_help("Run: distill quota");
        }
        AppError::TextTooShort { .. } | AppError::InvalidInput { .. } => {
            cli_error = cli_error.with_help("Run: distill analyze --help");
        }
        AppError::ApiKey | AppError::InvalidApiKey { .. } => {
            cli_error = cli_error.with_help("Run: distill config");
        }
        _ => {}
    }
    cli_error
}

/// Create an error for a failed or cancelled summarization run
pub fn from_orchestration_error(error: &OrchestrationError) -> CliError {
    match error {
        OrchestrationError::Failed { error, partial } => {
            let cli_error = from_app_error(error);
            let Some(partial) = partial else {
                return cli_error;
            };
            let cli_error = cli_error.with_context(format!(
                "{} of {} parts were summarized before the failure.",
                partial.completed.len(),
                partial.total_chunks
            ));
            match serde_json::to_value(partial) {
                Ok(value) => cli_error.with_partial(value),
                Err(_) => cli_error,
            }
        }
        OrchestrationError::Cancelled { drained } => CliError::new("Summarization cancelled")
            .with_code("cancelled")
            .with_context(format!("{} in-flight requests finished and were discarded.", drained)),
    }
}

/// Create error for a missing draft
pub fn draft_not_found(kind: &str) -> CliError {
    CliError::new(format!("No saved {} draft", kind))
        .with_code("draft_not_found")
        .with_suggestion(format!("Save one first: distill draft save {} --text \"...\"", kind))
        .with_help("Run: distill draft --help")
}

/// Create error for a missing input file
pub fn document_not_found(path: &str) -> CliError {
    CliError::new("Document not found")
        .with_code("invalid_input")
        .with_context(format!("The specified document does not exist.\n\nPath: {}", path))
        .with_suggestion("Check the file path and try again")
        .with_suggestion("Or pass the text directly: distill summarize --text \"...\"")
        .with_help("Run: distill summarize --help")
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    let error = match error.downcast::<CliError>() {
        Ok(cli_error) => return cli_error,
        Err(error) => error,
    };
    if let Some(orchestration) = error.downcast_ref::<OrchestrationError>() {
        return from_orchestration_error(orchestration);
    }
    if let Some(app_error) = error.downcast_ref::<AppError>() {
        return from_app_error(app_error);
    }

    let message = format!("{:#}", error);
    if message.contains("permission denied") || message.contains("Permission denied") {
        CliError::new("Permission denied")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check permissions on the data directory")
            .with_suggestion("Or choose another one: --data-dir <DIR>")
    } else {
        CliError::new(message)
    }
}
