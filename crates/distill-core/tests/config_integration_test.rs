//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > Environment variables > Config file > Defaults

use distill_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use distill_core::processing::ChunkBoundary;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: &[&str] = &[
    "DISTILL_DAILY_CAP",
    "DISTILL_MAX_IN_FLIGHT",
    "DISTILL_CHUNK_BOUNDARY",
    "DISTILL_SUMMARIZER",
    "DISTILL_API_KEY",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(
        r#"
daily_cap = 25
# Only override the cap, leave others as defaults
"#,
    );

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.daily_cap.value, 25);
    assert_eq!(config.daily_cap.source, ConfigSource::File);
    assert_eq!(config.max_in_flight.source, ConfigSource::Default);
    assert_eq!(config.summarizer.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    let file = config_file(
        r#"
daily_cap = 25
chunk_boundary = "paragraph"
summarizer = "ollama:file-model"
"#,
    );

    env::set_var("DISTILL_DAILY_CAP", "75");
    env::set_var("DISTILL_CHUNK_BOUNDARY", "sentence");
    env::set_var("DISTILL_SUMMARIZER", "ollama:env-model");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.daily_cap.value, 75);
    assert_eq!(config.daily_cap.source, ConfigSource::Environment);
    assert_eq!(config.chunk_boundary.value, ChunkBoundary::Sentence);
    assert_eq!(config.summarizer.value, "ollama:env-model");
    assert_eq!(config.summarizer.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();

    env::set_var("DISTILL_DAILY_CAP", "lots");
    env::set_var("DISTILL_CHUNK_BOUNDARY", "word");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.daily_cap.value, 50);
    assert_eq!(config.daily_cap.source, ConfigSource::Default);
    assert_eq!(config.chunk_boundary.value, ChunkBoundary::Section);

    clear_env();
}

#[test]
#[serial]
fn test_zero_env_cap_is_ignored() {
    clear_env();

    let file = config_file("daily_cap = 25");
    env::set_var("DISTILL_DAILY_CAP", "0");
    env::set_var("DISTILL_MAX_IN_FLIGHT", "0");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.daily_cap.value, 25);
    assert_eq!(config.daily_cap.source, ConfigSource::File);
    assert_eq!(config.max_in_flight.value, 2);
    assert_eq!(config.max_in_flight.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_api_key_only_from_environment() {
    clear_env();

    let file = config_file(r#"require_api_key = true"#);
    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();
    assert!(config.require_api_key.value);
    assert_eq!(config.api_key, None);

    env::set_var("DISTILL_API_KEY", "  secret-key  ");
    let config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.api_key.as_deref(), Some("secret-key"));

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();

    let file = config_file("daily_cap = 25\nmax_in_flight = 3");
    env::set_var("DISTILL_DAILY_CAP", "75");

    let mut config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();
    config.update_from_cli(CliConfigOverrides { daily_cap: Some(5), ..Default::default() });

    assert_eq!(config.daily_cap.value, 5);
    assert_eq!(config.daily_cap.source, ConfigSource::Cli);
    assert_eq!(config.max_in_flight.value, 3);
    assert_eq!(config.max_in_flight.source, ConfigSource::File);
    assert_eq!(config.debounce_ms.source, ConfigSource::Default);

    clear_env();
}

#[test]
fn test_invalid_toml_file() {
    let file = config_file("daily_cap = [not valid");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_invalid_boundary_in_file() {
    let file = config_file(r#"chunk_boundary = "word""#);
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_missing_config_file() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/distill.toml");
    assert!(result.is_err());
}
