//! DOCX extractor
//!
//! Paragraph text is joined with blank lines. Tables are rendered as
//! `|`-delimited rows so the structural analyzer can detect them.

use async_trait::async_trait;

use crate::classify::{classify, RawFailure};
use crate::error::Result;
use crate::formats::{read_document_bytes, Extractor};
use crate::models::{Document, ExtractionResult, SourceKind};

/// Encrypted Office documents are wrapped in an OLE compound file
const OLE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// DOCX extractor backed by docx-rs
pub struct DocxExtractor;

#[async_trait]
impl Extractor for DocxExtractor {
    async fn extract(&self, document: &Document) -> Result<ExtractionResult> {
        let bytes = read_document_bytes(document, "DOCX").await?;

        if bytes.starts_with(&OLE_MAGIC) {
            return Err(classify(RawFailure::Extraction {
                format: "DOCX".to_string(),
                message: "document is encrypted".to_string(),
            }));
        }

        let docx = match docx_rs::read_docx(&bytes) {
            Ok(docx) => docx,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", document.name(), e);
                return Ok(ExtractionResult::failure(format!("Failed to parse DOCX: {}", e)));
            }
        };

        let mut blocks = Vec::new();
        let mut table_count = 0;

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    let text = extract_paragraph_text(p);
                    if !text.trim().is_empty() {
                        blocks.push(text);
                    }
                }
                docx_rs::DocumentChild::Table(t) => {
                    let text = extract_table_text(t);
                    if !text.trim().is_empty() {
                        table_count += 1;
                        blocks.push(text);
                    }
                }
                _ => {}
            }
        }

        if blocks.is_empty() {
            tracing::warn!("DOCX contains no extractable text: {}", document.name());
            return Ok(ExtractionResult::failure("DOCX contains no extractable text"));
        }

        tracing::debug!(blocks = blocks.len(), tables = table_count, "Extracted DOCX text");

        Ok(ExtractionResult::success(blocks.join("\n\n"), 1.0))
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Docx
    }

    fn format_name(&self) -> &str {
        "DOCX"
    }
}

fn extract_paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    paragraph
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::ParagraphChild::Run(run) => Some(extract_run_text(run)),
            _ => None,
        })
        .collect()
}

fn extract_run_text(run: &docx_rs::Run) -> String {
    run.children
        .iter()
        .filter_map(|child| match child {
            docx_rs::RunChild::Text(text) => Some(text.text.as_str()),
            docx_rs::RunChild::Tab(_) => Some("\t"),
            _ => None,
        })
        .collect()
}

fn extract_table_text(table: &docx_rs::Table) -> String {
    let mut rows = Vec::new();

    for row_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = row_child;
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|cell_child| {
                let docx_rs::TableRowChild::TableCell(cell) = cell_child;
                cell.children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(p) => Some(extract_paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .collect();

        // Empty cells are kept so every row has the same column count
        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells.join(" | "));
        }
    }

    rows.join("\n")
}
