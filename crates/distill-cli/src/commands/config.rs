//! Config command implementation

use super::AppContext;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigRow};
use anyhow::Result;

pub fn execute(context: &AppContext, output: &OutputWriter) -> Result<()> {
    let mut entries: Vec<ConfigEntry> = context
        .config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source: format!("{:?}", source) })
        .collect();
    entries.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        output.result(entries)?;
        return Ok(());
    }

    output.section("Configuration");
    output.kv("Data directory", context.data_dir.display());
    if let Some(path) = &context.config_path {
        output.kv("Config file", path.display());
    }
    if context.config.api_key.is_some() {
        output.kv("API key", "set");
    }

    let rows: Vec<ConfigRow> = entries
        .into_iter()
        .map(|e| ConfigRow { key: e.key, value: e.value, source: e.source })
        .collect();
    output.table(rows);
    Ok(())
}
