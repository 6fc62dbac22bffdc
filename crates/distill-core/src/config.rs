use crate::error::{AppError, Result};
use crate::processing::ChunkBoundary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Distill
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub daily_cap: ConfigValue<u32>,
    pub max_in_flight: ConfigValue<usize>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub max_attempts: ConfigValue<u32>,
    pub backoff_base_ms: ConfigValue<u64>,
    pub debounce_ms: ConfigValue<u64>,
    pub min_text_chars: ConfigValue<usize>,
    pub max_key_points: ConfigValue<usize>,
    pub chunk_boundary: ConfigValue<ChunkBoundary>,
    pub summarizer: ConfigValue<String>,
    pub summarizer_url: ConfigValue<String>,
    pub require_api_key: ConfigValue<bool>,
    /// Only ever read from the environment
    pub api_key: Option<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            daily_cap: ConfigValue::new(50, ConfigSource::Default),
            max_in_flight: ConfigValue::new(2, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(30, ConfigSource::Default),
            max_attempts: ConfigValue::new(3, ConfigSource::Default),
            backoff_base_ms: ConfigValue::new(1000, ConfigSource::Default),
            debounce_ms: ConfigValue::new(2000, ConfigSource::Default),
            min_text_chars: ConfigValue::new(50, ConfigSource::Default),
            max_key_points: ConfigValue::new(5, ConfigSource::Default),
            chunk_boundary: ConfigValue::new(ChunkBoundary::Section, ConfigSource::Default),
            summarizer: ConfigValue::new("ollama:llama3.2".to_string(), ConfigSource::Default),
            summarizer_url: ConfigValue::new(
                "http://localhost:11434".to_string(),
                ConfigSource::Default,
            ),
            require_api_key: ConfigValue::new(false, ConfigSource::Default),
            api_key: None,
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::invalid_input(format!("Failed to read config file: {}", e))
        })?;

        let file_config: FileConfig = toml::from_str(&content)
            .map_err(|e| AppError::invalid_input(format!("Failed to parse TOML: {}", e)))?;

        if let Some(cap) = file_config.daily_cap {
            self.daily_cap.update(validate_positive("daily_cap", cap)?, ConfigSource::File);
        }
        if let Some(n) = file_config.max_in_flight {
            self.max_in_flight.update(validate_positive("max_in_flight", n)?, ConfigSource::File);
        }
        if let Some(secs) = file_config.request_timeout_secs {
            self.request_timeout_secs
                .update(validate_positive("request_timeout_secs", secs)?, ConfigSource::File);
        }
        if let Some(n) = file_config.max_attempts {
            self.max_attempts.update(validate_positive("max_attempts", n)?, ConfigSource::File);
        }
        if let Some(ms) = file_config.backoff_base_ms {
            self.backoff_base_ms.update(ms, ConfigSource::File);
        }
        if let Some(ms) = file_config.debounce_ms {
            self.debounce_ms.update(ms, ConfigSource::File);
        }
        if let Some(n) = file_config.min_text_chars {
            self.min_text_chars.update(n, ConfigSource::File);
        }
        if let Some(n) = file_config.max_key_points {
            self.max_key_points.update(n, ConfigSource::File);
        }
        if let Some(boundary) = file_config.chunk_boundary {
            self.chunk_boundary.update(parse_chunk_boundary(&boundary)?, ConfigSource::File);
        }
        if let Some(summarizer) = file_config.summarizer {
            self.summarizer.update(summarizer, ConfigSource::File);
        }
        if let Some(url) = file_config.summarizer_url {
            self.summarizer_url.update(url, ConfigSource::File);
        }
        if let Some(required) = file_config.require_api_key {
            self.require_api_key.update(required, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        env_positive("DISTILL_DAILY_CAP", &mut self.daily_cap);
        env_positive("DISTILL_MAX_IN_FLIGHT", &mut self.max_in_flight);
        env_positive("DISTILL_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs);
        env_positive("DISTILL_MAX_ATTEMPTS", &mut self.max_attempts);
        env_number("DISTILL_BACKOFF_BASE_MS", &mut self.backoff_base_ms);
        env_number("DISTILL_DEBOUNCE_MS", &mut self.debounce_ms);

        if let Ok(boundary_str) = env::var("DISTILL_CHUNK_BOUNDARY") {
            match parse_chunk_boundary(&boundary_str) {
                Ok(boundary) => self.chunk_boundary.update(boundary, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid DISTILL_CHUNK_BOUNDARY value '{}': expected section, paragraph, or sentence",
                    boundary_str
                ),
            }
        }

        if let Ok(summarizer) = env::var("DISTILL_SUMMARIZER") {
            self.summarizer.update(summarizer, ConfigSource::Environment);
        }

        if let Ok(url) = env::var("DISTILL_SUMMARIZER_URL") {
            self.summarizer_url.update(url, ConfigSource::Environment);
        }

        if let Ok(key) = env::var("DISTILL_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }

        self
    }

    /// Update configuration from CLI arguments.
    ///
    /// A zero cap or concurrency is ignored with a warning.
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(cap) = overrides.daily_cap {
            match validate_positive("daily_cap", cap) {
                Ok(cap) => self.daily_cap.update(cap, ConfigSource::Cli),
                Err(e) => tracing::warn!("Ignoring --daily-cap: {}", e),
            }
        }

        if let Some(n) = overrides.max_in_flight {
            match validate_positive("max_in_flight", n) {
                Ok(n) => self.max_in_flight.update(n, ConfigSource::Cli),
                Err(e) => tracing::warn!("Ignoring --max-in-flight: {}", e),
            }
        }

        if let Some(boundary) = overrides.chunk_boundary {
            self.chunk_boundary.update(boundary, ConfigSource::Cli);
        }

        if let Some(summarizer) = overrides.summarizer {
            self.summarizer.update(summarizer, ConfigSource::Cli);
        }
    }

    /// Model name from a `provider:model` summarizer spec
    pub fn summarizer_model(&self) -> &str {
        self.summarizer
            .value
            .split_once(':')
            .map(|(_, model)| model)
            .unwrap_or(&self.summarizer.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("daily_cap".to_string(), (self.daily_cap.value.to_string(), self.daily_cap.source));
        map.insert(
            "max_in_flight".to_string(),
            (self.max_in_flight.value.to_string(), self.max_in_flight.source),
        );
        map.insert(
            "request_timeout".to_string(),
            (format!("{}s", self.request_timeout_secs.value), self.request_timeout_secs.source),
        );
        map.insert(
            "max_attempts".to_string(),
            (self.max_attempts.value.to_string(), self.max_attempts.source),
        );
        map.insert(
            "backoff_base".to_string(),
            (format!("{}ms", self.backoff_base_ms.value), self.backoff_base_ms.source),
        );
        map.insert(
            "debounce".to_string(),
            (format!("{}ms", self.debounce_ms.value), self.debounce_ms.source),
        );
        map.insert(
            "min_text_chars".to_string(),
            (self.min_text_chars.value.to_string(), self.min_text_chars.source),
        );
        map.insert(
            "max_key_points".to_string(),
            (self.max_key_points.value.to_string(), self.max_key_points.source),
        );
        map.insert(
            "chunk_boundary".to_string(),
            (format!("{:?}", self.chunk_boundary.value), self.chunk_boundary.source),
        );
        map.insert("summarizer".to_string(), (self.summarizer.value.clone(), self.summarizer.source));
        map.insert(
            "summarizer_url".to_string(),
            (self.summarizer_url.value.clone(), self.summarizer_url.source),
        );
        map.insert(
            "require_api_key".to_string(),
            (self.require_api_key.value.to_string(), self.require_api_key.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    daily_cap: Option<u32>,
    max_in_flight: Option<usize>,
    request_timeout_secs: Option<u64>,
    max_attempts: Option<u32>,
    backoff_base_ms: Option<u64>,
    debounce_ms: Option<u64>,
    min_text_chars: Option<usize>,
    max_key_points: Option<usize>,
    chunk_boundary: Option<String>,
    summarizer: Option<String>,
    summarizer_url: Option<String>,
    require_api_key: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub daily_cap: Option<u32>,
    pub max_in_flight: Option<usize>,
    pub chunk_boundary: Option<ChunkBoundary>,
    pub summarizer: Option<String>,
}

/// Parse chunk boundary rule from string
pub fn parse_chunk_boundary(s: &str) -> Result<ChunkBoundary> {
    match s.to_lowercase().as_str() {
        "section" | "sections" => Ok(ChunkBoundary::Section),
        "paragraph" | "paragraphs" => Ok(ChunkBoundary::Paragraph),
        "sentence" | "sentences" => Ok(ChunkBoundary::Sentence),
        _ => Err(AppError::invalid_input(format!(
            "Invalid chunk boundary: {}. Use section, paragraph, or sentence",
            s
        ))),
    }
}

fn validate_positive<T>(key: &str, value: T) -> Result<T>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(AppError::invalid_input(format!("{} must be greater than zero (got {})", key, value)))
    }
}

fn env_number<T>(name: &str, target: &mut ConfigValue<T>)
where
    T: std::str::FromStr,
{
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => target.update(value, ConfigSource::Environment),
            Err(_) => tracing::warn!("Invalid {} value '{}': expected a number", name, raw),
        }
    }
}

/// Like `env_number`, but zero is ignored with a warning
fn env_positive<T>(name: &str, target: &mut ConfigValue<T>)
where
    T: std::str::FromStr + PartialOrd + Default + std::fmt::Display,
{
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => match validate_positive(name, value) {
                Ok(value) => target.update(value, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring {}: {}", name, e),
            },
            Err(_) => tracing::warn!("Invalid {} value '{}': expected a number", name, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.daily_cap.value, 50);
        assert_eq!(config.daily_cap.source, ConfigSource::Default);
        assert_eq!(config.max_in_flight.value, 2);
        assert_eq!(config.request_timeout_secs.value, 30);
        assert_eq!(config.max_attempts.value, 3);
        assert_eq!(config.debounce_ms.value, 2000);
        assert_eq!(config.chunk_boundary.value, ChunkBoundary::Section);
        assert_eq!(config.summarizer.value, "ollama:llama3.2");
        assert_eq!(config.summarizer_model(), "llama3.2");
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
daily_cap = 20
max_in_flight = 4
chunk_boundary = "paragraph"
summarizer = "ollama:mistral"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.daily_cap.value, 20);
        assert_eq!(config.daily_cap.source, ConfigSource::File);
        assert_eq!(config.max_in_flight.value, 4);
        assert_eq!(config.chunk_boundary.value, ChunkBoundary::Paragraph);
        assert_eq!(config.summarizer_model(), "mistral");
        assert_eq!(config.debounce_ms.source, ConfigSource::Default);
    }

    #[test]
    fn test_cli_zero_cap_is_ignored() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            daily_cap: Some(0),
            max_in_flight: Some(0),
            ..Default::default()
        });

        assert_eq!(config.daily_cap.value, 50);
        assert_eq!(config.daily_cap.source, ConfigSource::Default);
        assert_eq!(config.max_in_flight.value, 2);
        assert_eq!(config.max_in_flight.source, ConfigSource::Default);
    }

    #[test]
    fn test_file_rejects_zero_cap() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "daily_cap = 0").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            daily_cap: Some(10),
            chunk_boundary: Some(ChunkBoundary::Sentence),
            ..Default::default()
        });

        assert_eq!(config.daily_cap.value, 10);
        assert_eq!(config.daily_cap.source, ConfigSource::Cli);
        assert_eq!(config.chunk_boundary.value, ChunkBoundary::Sentence);
        assert_eq!(config.max_in_flight.source, ConfigSource::Default);
        assert_eq!(config.summarizer.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_chunk_boundary() {
        assert_eq!(parse_chunk_boundary("section").unwrap(), ChunkBoundary::Section);
        assert_eq!(parse_chunk_boundary("PARAGRAPHS").unwrap(), ChunkBoundary::Paragraph);
        assert_eq!(parse_chunk_boundary("sentence").unwrap(), ChunkBoundary::Sentence);
        assert!(parse_chunk_boundary("word").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("daily_cap"));
        assert!(map.contains_key("chunk_boundary"));
        assert!(!map.contains_key("api_key"));

        let (timeout, source) = &map["request_timeout"];
        assert_eq!(timeout, "30s");
        assert_eq!(*source, ConfigSource::Default);
    }
}
