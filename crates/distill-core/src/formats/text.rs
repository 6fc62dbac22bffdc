use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::formats::Extractor;
use crate::models::{Document, DocumentSource, ExtractionResult, SourceKind};

/// Plain text extractor for typed input and UTF-8 files
pub struct TextExtractor;

#[async_trait]
impl Extractor for TextExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        let text = match document.source() {
            DocumentSource::Inline(text) => text.clone(),
            DocumentSource::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        return Err(AppError::invalid_input(format!(
                            "{} is not valid UTF-8 text: {}",
                            document.name(),
                            e
                        )))
                    }
                }
            }
        };

        let confidence = if text.trim().is_empty() { 0.0 } else { 1.0 };
        Ok(ExtractionResult::success(text, confidence))
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Text
    }

    fn format_name(&self) -> &str {
        "Text"
    }
}
