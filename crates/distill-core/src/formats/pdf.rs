use async_trait::async_trait;

use crate::classify::{classify, RawFailure};
use crate::error::Result;
use crate::formats::{printable_ratio, read_document_bytes, Extractor};
use crate::models::{Document, ExtractionResult, SourceKind};

/// PDF extractor backed by pdf-extract
pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        if document.is_password_protected() {
            return Err(classify(RawFailure::Extraction {
                format: "PDF".to_string(),
                message: "document is encrypted".to_string(),
            }));
        }

        let bytes = read_document_bytes(document, "PDF").await?;

        // pdf-extract is synchronous and may panic on malformed input
        let extracted = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .unwrap_or_else(|e| Err(format!("parser aborted: {}", e)));

        let text = match extracted {
            Ok(text) => text,
            Err(message) => {
                if message.to_lowercase().contains("encrypt") {
                    return Err(classify(RawFailure::Extraction {
                        format: "PDF".to_string(),
                        message,
                    }));
                }
                tracing::warn!("Failed to extract text from {}: {}", document.name(), message);
                return Ok(ExtractionResult::failure(format!("Failed to extract text: {}", message)));
            }
        };

        if text.trim().is_empty() {
            tracing::warn!("PDF contains no extractable text: {}", document.name());
            return Ok(ExtractionResult::failure(
                "PDF contains no extractable text (may be image-based or empty)",
            ));
        }

        tracing::debug!(
            pages = estimate_page_count(&text),
            chars = text.len(),
            "Extracted PDF text"
        );

        let confidence = printable_ratio(&text);
        Ok(ExtractionResult::success(text, confidence))
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Pdf
    }

    fn format_name(&self) -> &str {
        "PDF"
    }
}

/// Estimate page count from extracted text
pub fn estimate_page_count(text: &str) -> usize {
    // Count form feed characters (page breaks)
    let form_feeds = text.chars().filter(|&c| c == '\x0C').count();

    if form_feeds > 0 {
        form_feeds + 1
    } else {
        // Assume ~3000 characters per page
        let estimated = (text.len() as f64 / 3000.0).ceil() as usize;
        estimated.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::io::Write;

    #[test]
    fn test_estimate_page_count_with_form_feeds() {
        assert_eq!(estimate_page_count("Page 1\x0CPage 2\x0CPage 3"), 3);
    }

    #[test]
    fn test_estimate_page_count_without_form_feeds() {
        let text = "a".repeat(6000);
        assert_eq!(estimate_page_count(&text), 2);
        assert_eq!(estimate_page_count(""), 1);
    }

    #[tokio::test]
    async fn test_refuses_password_protected() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "%PDF-1.4\n1 0 obj << /Type /Page >>\ntrailer << /Encrypt 2 0 R >>").unwrap();

        let doc = Document::from_path(file.path()).unwrap();
        let err = PdfExtractor.extract(&doc).await.unwrap_err();
        assert_eq!(err, AppError::invalid_input("PDF document is password protected"));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_failed_result() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        write!(file, "this is not a pdf").unwrap();

        let doc = Document::from_path(file.path()).unwrap();
        let result = PdfExtractor.extract(&doc).await.unwrap();
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_inline_input_rejected() {
        let result = PdfExtractor.extract(&Document::from_text("not a file")).await;
        assert!(matches!(result, Err(AppError::InvalidInput { .. })));
    }
}
