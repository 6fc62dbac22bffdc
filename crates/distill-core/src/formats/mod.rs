//! Extraction adapter layer
//!
//! Each source kind is served by an `Extractor`. The `ExtractorRegistry` picks
//! the extractor for a document's kind and normalizes what it returns, so the
//! rest of the pipeline only ever sees an `ExtractionResult`.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{Document, DocumentSource, ExtractionResult, SourceKind};

pub mod docx;
pub mod pdf;
pub mod text;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

/// Extracted text longer than this is truncated
pub const MAX_TEXT_CHARS: usize = 500_000;

/// Extraction trait that all source readers implement
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract raw text from the document.
    ///
    /// Parser failures are reported through a failed `ExtractionResult`;
    /// `Err` is reserved for documents the extractor refuses to open.
    async fn extract(&self, document: &Document) -> Result<ExtractionResult>;

    /// Source kind this extractor serves
    fn source_kind(&self) -> SourceKind;

    /// Human-readable format name (e.g., "PDF")
    fn format_name(&self) -> &str;
}

/// Central registry for extractors, keyed by source kind
pub struct ExtractorRegistry {
    extractors: HashMap<SourceKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { extractors: HashMap::new() }
    }

    /// Registry with the built-in text, PDF and DOCX extractors.
    ///
    /// Image scans need an OCR extractor registered by the caller.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TextExtractor));
        registry.register(Box::new(PdfExtractor));
        registry.register(Box::new(DocxExtractor));
        registry
    }

    /// Register an extractor, replacing any previous one for the same kind
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.source_kind(), extractor);
    }

    pub fn supports(&self, kind: SourceKind) -> bool {
        self.extractors.contains_key(&kind)
    }

    /// Supported kinds, in a stable order
    pub fn supported_kinds(&self) -> Vec<SourceKind> {
        let mut kinds: Vec<_> = self.extractors.keys().copied().collect();
        kinds.sort_by_key(|k| k.label());
        kinds
    }

    /// Extract text from a document with the matching extractor
    pub async fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        let extractor = self.extractors.get(&document.kind()).ok_or_else(|| {
            match document.kind() {
                SourceKind::ImageScan => AppError::OcrFailed {
                    reason: "no text recognition engine is configured".to_string(),
                },
                kind => AppError::invalid_input(format!("No extractor registered for {}", kind)),
            }
        })?;

        tracing::debug!(
            document = %document.name(),
            format = extractor.format_name(),
            "Extracting text"
        );

        let mut result = extractor.extract(document).await?;

        if document.kind() == SourceKind::ImageScan && !result.success {
            return Err(AppError::OcrFailed {
                reason: result.error.unwrap_or_else(|| "no text recognized".to_string()),
            });
        }

        if result.text.chars().count() > MAX_TEXT_CHARS {
            tracing::warn!(
                "{} exceeds {} characters, truncating extracted text",
                document.name(),
                MAX_TEXT_CHARS
            );
            result.text = result.text.chars().take(MAX_TEXT_CHARS).collect();
        }

        Ok(result)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Read a file-backed document's bytes
pub(crate) async fn read_document_bytes(document: &Document, format: &str) -> Result<Vec<u8>> {
    match document.source() {
        DocumentSource::File(path) => Ok(tokio::fs::read(path).await?),
        DocumentSource::Inline(_) => {
            Err(AppError::invalid_input(format!("{} input must be a file", format)))
        }
    }
}

/// Ratio of printable characters, used as an extraction confidence proxy
pub(crate) fn printable_ratio(text: &str) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .filter(|c| *c != '\u{FFFD}')
        .count();
    printable as f32 / total as f32
}
