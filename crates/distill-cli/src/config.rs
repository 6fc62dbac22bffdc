//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use distill_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "DISTILL_DATA_DIR";
const DEFAULT_DATA_DIR: &str = ".distill";
const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory: explicit flag, then environment, then `./.distill`
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

/// Load layered configuration: defaults, then the config file, then the
/// environment, then CLI overrides.
///
/// An explicit config path must exist; the default `<data-dir>/config.toml`
/// is optional.
pub fn load_config(
    data_dir: &Path,
    explicit: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    let config_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(data_dir.join(CONFIG_FILE)).filter(|p| p.exists()),
    };

    if let Some(path) = config_path {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distill_core::config::ConfigSource;
    use tempfile::TempDir;

    #[test]
    fn test_missing_default_config_is_optional() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path(), None, CliConfigOverrides::default()).unwrap();
        assert_eq!(config.daily_cap.source, ConfigSource::Default);
    }

    #[test]
    fn test_config_file_and_cli_override() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "daily_cap = 20\nmax_attempts = 4\n").unwrap();

        let config = load_config(
            dir.path(),
            None,
            CliConfigOverrides { daily_cap: Some(5), ..Default::default() },
        )
        .unwrap();

        assert_eq!(config.max_attempts.value, 4);
        assert_eq!(config.max_attempts.source, ConfigSource::File);
        assert_eq!(config.daily_cap.value, 5);
        assert_eq!(config.daily_cap.source, ConfigSource::Cli);
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing), CliConfigOverrides::default()).is_err());
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        assert_eq!(resolve_data_dir(Some(Path::new("/tmp/d"))), PathBuf::from("/tmp/d"));
    }
}
