use chrono::{DateTime, Utc};
use distill_core::models::{
    DocumentType, ProcessingOption, ProcessingStrategy, RateLimitStatus, ReadingLevel, SectionKind,
};
use distill_engine::ChunkSummary;
use serde::Serialize;
use tabled::Tabled;

/// Output for analyze command
#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    pub document: String,
    pub source_kind: String,
    pub characters: usize,
    pub extraction_confidence: f32,
    pub document_type: DocumentType,
    pub reading_level: ReadingLevel,
    pub language: String,
    pub sections: Vec<SectionInfo>,
    pub tables: Vec<TableInfo>,
    pub key_points: Vec<String>,
    pub metrics: MetricsInfo,
}

#[derive(Debug, Serialize)]
pub struct SectionInfo {
    pub title: Option<String>,
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Serialize)]
pub struct TableInfo {
    pub rows: usize,
    pub columns: usize,
    pub delimiter: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsInfo {
    pub extraction_ms: u128,
    pub analysis_ms: u128,
    pub text_quality: f32,
    pub structure_complexity: f32,
}

/// Output for plan command
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub document: String,
    pub characters: usize,
    pub options: Vec<ProcessingOption>,
    pub quota: QuotaOutput,
}

/// Output for summarize command
#[derive(Debug, Serialize)]
pub struct SummarizeOutput {
    pub document: String,
    pub summarizer: String,
    pub strategy: ProcessingStrategy,
    pub quota_constrained: bool,
    pub requests_used: u32,
    pub consolidated: bool,
    pub summary: String,
    pub chunks: Vec<ChunkSummary>,
    pub quota: QuotaOutput,
}

/// Output for quota command
#[derive(Debug, Serialize)]
pub struct QuotaOutput {
    pub requests_used: u32,
    pub daily_cap: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub near_limit: bool,
    pub over_limit: bool,
}

impl From<RateLimitStatus> for QuotaOutput {
    fn from(status: RateLimitStatus) -> Self {
        Self {
            requests_used: status.requests_used,
            daily_cap: status.daily_cap,
            remaining: status.remaining(),
            reset_at: status.reset_at,
            near_limit: status.is_near_limit(),
            over_limit: status.is_over_limit(),
        }
    }
}

/// Output for draft commands
#[derive(Debug, Serialize)]
pub struct DraftOutput {
    pub kind: String,
    pub content: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}

/// Table row for processing options
#[derive(Tabled)]
pub struct OptionRow {
    #[tabled(rename = "Strategy")]
    pub strategy: String,
    #[tabled(rename = "Requests")]
    pub requests: u32,
    #[tabled(rename = "Recommended")]
    pub recommended: String,
    #[tabled(rename = "Benefits")]
    pub benefits: String,
    #[tabled(rename = "Drawbacks")]
    pub drawbacks: String,
}

impl From<&ProcessingOption> for OptionRow {
    fn from(option: &ProcessingOption) -> Self {
        let mut strategy = option.strategy.to_string();
        if option.quota_constrained {
            strategy.push_str(" (quota)");
        }
        Self {
            strategy,
            requests: option.estimated_requests,
            recommended: if option.recommended { "✓" } else { "" }.to_string(),
            benefits: option.benefits.join("\n"),
            drawbacks: option.drawbacks.join("\n"),
        }
    }
}

/// Table row for detected sections
#[derive(Tabled)]
pub struct SectionRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Bytes")]
    pub bytes: usize,
}

/// Table row for config inspection
#[derive(Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
