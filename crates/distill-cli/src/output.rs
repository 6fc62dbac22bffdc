use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Writes command results either as styled text or as one JSON document.
///
/// In JSON mode stdout carries exactly one `{"status", "data"}` envelope,
/// so every human-only helper is a no-op there.
pub struct OutputWriter {
    json: bool,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    fn human(&self, line: impl FnOnce() -> String) {
        if !self.json {
            println!("{}", line());
        }
    }

    pub fn success(&self, message: impl Display) {
        self.human(|| format!("{} {}", style("✓").green().bold(), message));
    }

    pub fn info(&self, message: impl Display) {
        self.human(|| format!("{} {}", style("ℹ").blue().bold(), message));
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        self.human(|| format!("{}: {}", style(key).bold(), value));
    }

    pub fn section(&self, title: impl Display) {
        self.human(|| format!("\n{}", style(title).bold().underlined()));
    }

    /// Free-form text block, printed as-is
    pub fn text(&self, text: impl Display) {
        self.human(|| text.to_string());
    }

    /// Warnings go to stderr in both modes
    pub fn warning(&self, message: impl Display) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "status": "warning", "message": message.to_string() }));
        } else {
            eprintln!("{} {}", style("⚠").yellow().bold(), message);
        }
    }

    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.json {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(none)").dim());
            return;
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    /// Print a command result; JSON mode wraps it in a success envelope
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let rendered = if self.json {
            serde_json::to_string_pretty(&serde_json::json!({ "status": "success", "data": data }))?
        } else {
            serde_json::to_string_pretty(&data)?
        };
        println!("{}", rendered);
        Ok(())
    }
}
