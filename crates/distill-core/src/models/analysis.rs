use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::time::Duration;

/// Broad classification of a document's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Narrative,
    Technical,
    Tabular,
    Mixed,
    Unknown,
}

/// Estimated reading difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingLevel {
    Basic,
    Intermediate,
    Advanced,
}

/// Kind of content a section holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Paragraph,
    List,
    Table,
}

/// A contiguous region of the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Heading that introduces the section, if any
    pub title: Option<String>,

    pub kind: SectionKind,

    /// Byte span of the heading line, when the title came from one
    pub heading_span: Option<Range<usize>>,

    /// Byte span of the section body in the source text
    pub span: Range<usize>,
}

impl Section {
    /// Offset where the section begins, heading included
    pub fn start(&self) -> usize {
        self.heading_span.as_ref().map_or(self.span.start, |h| h.start)
    }
}

/// A table-like region of delimiter-separated rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRegion {
    /// Byte span of the table in the source text
    pub span: Range<usize>,
    pub rows: usize,
    pub columns: usize,
    pub delimiter: char,
}

/// Structural description of extracted text.
///
/// Sections are non-overlapping and ordered by position; at least one
/// section exists whenever the analyzed text is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    pub document_type: DocumentType,
    pub reading_level: ReadingLevel,
    pub language: String,
    pub sections: Vec<Section>,
    pub tables: Vec<TableRegion>,
    pub key_points: Vec<String>,
}

impl StructuredData {
    /// Structure used when nothing could be recognized
    pub fn unknown() -> Self {
        Self {
            document_type: DocumentType::Unknown,
            reading_level: ReadingLevel::Basic,
            language: "und".to_string(),
            sections: Vec::new(),
            tables: Vec::new(),
            key_points: Vec::new(),
        }
    }

    /// Byte offsets at which sections start, excluding the first
    pub fn section_boundaries(&self) -> Vec<usize> {
        self.sections.iter().skip(1).map(Section::start).collect()
    }
}

/// Timing and quality metrics for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetrics {
    pub extraction_time: Duration,
    pub analysis_time: Duration,
    /// Text quality in [0, 1]
    pub text_quality: f32,
    /// Structure complexity in [0, 1]
    pub structure_complexity: f32,
}
