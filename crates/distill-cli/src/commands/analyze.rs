//! Analyze command implementation

use super::{load_document, AppContext};
use crate::cli::AnalyzeArgs;
use crate::output::OutputWriter;
use crate::output_types::{AnalyzeOutput, MetricsInfo, SectionInfo, SectionRow, TableInfo};
use crate::progress::SummaryProgress;
use anyhow::Result;
use distill_engine::PreparedDocument;

pub async fn execute(args: AnalyzeArgs, context: &AppContext, output: &OutputWriter) -> Result<()> {
    let document = load_document(&args.input, context).await?;
    let pipeline = context.pipeline().await?;

    let mut progress = SummaryProgress::new(output.is_json());
    let prepared = pipeline.prepare(document, |event| progress.update(event)).await;
    progress.clear();
    let prepared = prepared?;

    if output.is_json() {
        output.result(analyze_output(&prepared))?;
        return Ok(());
    }

    let structure = &prepared.analysis.structure;
    let metrics = &prepared.analysis.metrics;

    output.section("Document");
    output.kv("Name", prepared.document.name());
    output.kv("Source", prepared.document.kind());
    output.kv("Characters", prepared.char_count());
    output.kv("Extraction confidence", format!("{:.0}%", prepared.extraction.confidence * 100.0));

    output.section("Structure");
    output.kv("Type", format!("{:?}", structure.document_type));
    output.kv("Reading level", format!("{:?}", structure.reading_level));
    output.kv("Language", &structure.language);
    output.kv("Sections", structure.sections.len());
    output.kv("Tables", structure.tables.len());
    output.kv("Text quality", format!("{:.2}", metrics.text_quality));
    output.kv("Complexity", format!("{:.2}", metrics.structure_complexity));

    if !structure.key_points.is_empty() {
        output.section("Key Points");
        for point in &structure.key_points {
            output.text(format!("  • {}", point));
        }
    }

    if args.verbose {
        output.section("Sections");
        let rows: Vec<SectionRow> = structure
            .sections
            .iter()
            .enumerate()
            .map(|(i, section)| SectionRow {
                index: i + 1,
                title: section.title.clone().unwrap_or_else(|| "-".to_string()),
                kind: format!("{:?}", section.kind),
                bytes: section.span.len(),
            })
            .collect();
        output.table(rows);
    }

    Ok(())
}

fn analyze_output(prepared: &PreparedDocument) -> AnalyzeOutput {
    let structure = &prepared.analysis.structure;
    let metrics = &prepared.analysis.metrics;

    AnalyzeOutput {
        document: prepared.document.name(),
        source_kind: prepared.document.kind().label().to_string(),
        characters: prepared.char_count(),
        extraction_confidence: prepared.extraction.confidence,
        document_type: structure.document_type,
        reading_level: structure.reading_level,
        language: structure.language.clone(),
        sections: structure
            .sections
            .iter()
            .map(|s| SectionInfo {
                title: s.title.clone(),
                kind: s.kind,
                start: s.span.start,
                end: s.span.end,
            })
            .collect(),
        tables: structure
            .tables
            .iter()
            .map(|t| TableInfo { rows: t.rows, columns: t.columns, delimiter: t.delimiter.to_string() })
            .collect(),
        key_points: structure.key_points.clone(),
        metrics: MetricsInfo {
            extraction_ms: metrics.extraction_time.as_millis(),
            analysis_ms: metrics.analysis_time.as_millis(),
            text_quality: metrics.text_quality,
            structure_complexity: metrics.structure_complexity,
        },
    }
}
