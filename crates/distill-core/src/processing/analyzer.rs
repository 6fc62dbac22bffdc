//! Structural analysis of extracted text
//!
//! The analyzer segments text into sections (paragraph breaks and
//! heading-like lines), detects delimiter-separated tables, scores sentences
//! for key points and delegates whole-document classification to a
//! [`TextClassifier`]. It is a pure function of its input.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::classifier::{is_stop_word, HeuristicClassifier, TextClassifier};
use super::{blocks, lines, sentence_spans, words};
use crate::config::LayeredConfig;
use crate::error::{AppError, Result};
use crate::models::{
    ExtractionResult, ProcessingMetrics, Section, SectionKind, StructuredData, TableRegion,
};

/// Headings longer than this are treated as prose
const MAX_HEADING_CHARS: usize = 80;
const MAX_HEADING_WORDS: usize = 10;

/// Key-point candidates outside this word range are skipped
const KEY_POINT_WORDS: Range<usize> = 4..61;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Minimum non-whitespace-trimmed character count
    pub min_text_chars: usize,
    pub max_key_points: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { min_text_chars: 50, max_key_points: 5 }
    }
}

impl AnalyzerConfig {
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            min_text_chars: config.min_text_chars.value,
            max_key_points: config.max_key_points.value,
        }
    }
}

/// Output of one analyzer run
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub structure: StructuredData,
    pub metrics: ProcessingMetrics,
}

impl Analysis {
    /// Record how long extraction took before this analysis
    pub fn with_extraction_time(mut self, elapsed: Duration) -> Self {
        self.metrics.extraction_time = elapsed;
        self
    }
}

/// Structural analyzer
#[derive(Clone)]
pub struct StructuralAnalyzer {
    config: AnalyzerConfig,
    classifier: Arc<dyn TextClassifier>,
}

impl Default for StructuralAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl StructuralAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config, classifier: Arc::new(HeuristicClassifier) }
    }

    /// Replace the document classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn TextClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validate an extraction result and analyze its text
    pub fn analyze(&self, extraction: &ExtractionResult) -> Result<Analysis> {
        let started = Instant::now();

        if !extraction.success {
            return Err(AppError::invalid_input(
                extraction.error.clone().unwrap_or_else(|| "Text extraction failed".to_string()),
            ));
        }

        let actual = extraction.text.trim().chars().count();
        if actual == 0 {
            return Err(AppError::invalid_input("No text to analyze"));
        }
        if actual < self.config.min_text_chars {
            return Err(AppError::TextTooShort { min: self.config.min_text_chars, actual });
        }

        let structure = self.structure(&extraction.text);
        let metrics = ProcessingMetrics {
            extraction_time: Duration::ZERO,
            analysis_time: started.elapsed(),
            text_quality: text_quality(&extraction.text, extraction.confidence),
            structure_complexity: structure_complexity(&structure),
        };

        tracing::debug!(
            sections = structure.sections.len(),
            tables = structure.tables.len(),
            key_points = structure.key_points.len(),
            document_type = ?structure.document_type,
            "Analyzed text"
        );

        Ok(Analysis { structure, metrics })
    }

    /// Structure of `text`, without input validation
    pub fn structure(&self, text: &str) -> StructuredData {
        let tables = detect_tables(text);
        let sections = segment(text, &tables);

        if sections.is_empty() {
            return StructuredData::unknown();
        }

        let key_points = extract_key_points(text, &sections, self.config.max_key_points);

        StructuredData {
            document_type: self.classifier.document_type(text, &sections, &tables),
            reading_level: self.classifier.reading_level(text),
            language: self.classifier.language(text),
            sections,
            tables,
            key_points,
        }
    }
}

/// Split text into sections at blank lines, attaching heading lines as titles
fn segment(text: &str, tables: &[TableRegion]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut pending: Option<(String, Range<usize>)> = None;

    for block in blocks(text) {
        let block_lines: Vec<(Range<usize>, &str)> = lines(&text[block.clone()])
            .into_iter()
            .map(|(span, line)| (block.start + span.start..block.start + span.end, line))
            .collect();

        let (first_span, first_line) = block_lines[0].clone();
        let leading_heading = !in_table(&first_span, tables) && is_heading(first_line);

        if leading_heading && block_lines.len() == 1 {
            // A heading on its own; a previous lone heading becomes its own section
            if let Some((title, span)) = pending.take() {
                sections.push(heading_only_section(title, span));
            }
            pending = Some((heading_title(first_line), first_span));
            continue;
        }

        let (title, heading_span, body) = if leading_heading {
            if let Some((title, span)) = pending.take() {
                sections.push(heading_only_section(title, span));
            }
            let body_start = block_lines[1].0.start;
            (Some(heading_title(first_line)), Some(first_span), body_start..block.end)
        } else {
            match pending.take() {
                Some((title, span)) => (Some(title), Some(span), block.clone()),
                None => (None, None, block.clone()),
            }
        };

        let body_lines: Vec<&str> = block_lines
            .iter()
            .filter(|(span, _)| span.start >= body.start)
            .map(|(_, line)| *line)
            .collect();

        sections.push(Section { title, kind: section_kind(&body, &body_lines, tables), heading_span, span: body });
    }

    if let Some((title, span)) = pending {
        sections.push(heading_only_section(title, span));
    }
    sections
}

fn heading_only_section(title: String, span: Range<usize>) -> Section {
    Section { title: Some(title), kind: SectionKind::Paragraph, heading_span: None, span }
}

fn section_kind(body: &Range<usize>, body_lines: &[&str], tables: &[TableRegion]) -> SectionKind {
    if in_table(body, tables) {
        return SectionKind::Table;
    }

    let list_lines = body_lines.iter().filter(|l| is_list_item(l.trim())).count();
    if list_lines * 2 >= body_lines.len() && list_lines > 0 {
        SectionKind::List
    } else {
        SectionKind::Paragraph
    }
}

fn in_table(span: &Range<usize>, tables: &[TableRegion]) -> bool {
    tables.iter().any(|t| t.span.start <= span.start && span.end <= t.span.end)
}

fn is_list_item(line: &str) -> bool {
    if ["- ", "* ", "+ ", "• "].iter().any(|m| line.starts_with(m)) {
        return true;
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 && digits <= 3 {
        let rest = &line[digits..];
        return rest.starts_with(". ") || rest.starts_with(") ");
    }

    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some(')'), Some(' ')) if c.is_ascii_lowercase()
    )
}

fn strip_list_marker(line: &str) -> &str {
    if !is_list_item(line) {
        return line;
    }
    line.split_once(' ').map_or(line, |(_, rest)| rest.trim_start())
}

fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    if line.starts_with('#') {
        return true;
    }
    if is_list_item(line) || line.contains('|') || line.contains('\t') {
        return false;
    }
    if line.ends_with(['.', '!', '?', ',', ';']) {
        return false;
    }

    let word_list: Vec<&str> = line.split_whitespace().collect();
    if word_list.is_empty() || word_list.len() > MAX_HEADING_WORDS {
        return false;
    }
    if line.ends_with(':') {
        return true;
    }

    // Numbered headings such as "2.1 Results"
    let numbered = word_list[0].contains('.')
        && word_list[0].chars().all(|c| c.is_ascii_digit() || c == '.')
        && word_list.len() > 1;
    if numbered {
        return true;
    }

    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    if letters.iter().all(|c| c.is_uppercase()) {
        return true;
    }

    // Title case: significant words capitalized
    word_list
        .iter()
        .filter(|w| w.chars().count() > 3)
        .all(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        && word_list[0].chars().next().is_some_and(|c| c.is_uppercase())
}

fn heading_title(line: &str) -> String {
    line.trim().trim_start_matches('#').trim().trim_end_matches(':').trim().to_string()
}

/// Runs of at least two lines splitting into the same number of columns
fn detect_tables(text: &str) -> Vec<TableRegion> {
    let all_lines = lines(text);
    let mut tables = Vec::new();
    let mut i = 0;

    while i < all_lines.len() {
        let mut matched = None;

        for delimiter in ['|', '\t', ','] {
            let columns = column_count(all_lines[i].1, delimiter);
            let (min_columns, min_rows) = if delimiter == ',' { (3, 3) } else { (2, 2) };
            if columns < min_columns {
                continue;
            }

            let mut j = i + 1;
            while j < all_lines.len() && column_count(all_lines[j].1, delimiter) == columns {
                j += 1;
            }

            // Comma-separated prose is common; require sentence-free rows
            let prose = delimiter == ',' && all_lines[i..j].iter().any(|(_, l)| l.trim_end().ends_with('.'));
            if j - i >= min_rows && !prose {
                matched = Some((delimiter, columns, j));
                break;
            }
        }

        match matched {
            Some((delimiter, columns, j)) => {
                tables.push(TableRegion {
                    span: all_lines[i].0.start..all_lines[j - 1].0.end,
                    rows: j - i,
                    columns,
                    delimiter,
                });
                i = j;
            }
            None => i += 1,
        }
    }
    tables
}

fn column_count(line: &str, delimiter: char) -> usize {
    let line = line.trim();
    if !line.contains(delimiter) {
        return 0;
    }
    if delimiter == '|' {
        line.trim_start_matches('|').trim_end_matches('|').split('|').count()
    } else {
        line.split(delimiter).count()
    }
}

/// Top sentences by position and keyword density, returned in source order
fn extract_key_points(text: &str, sections: &[Section], max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }

    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for word in words(text) {
        let word = word.to_lowercase();
        if word.chars().count() >= 4 && !is_stop_word(&word) {
            *frequencies.entry(word).or_default() += 1;
        }
    }
    let max_frequency = frequencies.values().copied().max().unwrap_or(1) as f64;

    let mut candidates: Vec<(usize, f64, String)> = Vec::new();
    for (section_index, section) in sections.iter().enumerate() {
        if section.kind == SectionKind::Table {
            continue;
        }

        // List entries are candidates on their own, markers stripped
        let units: Vec<&str> = if section.kind == SectionKind::List {
            text[section.span.clone()].lines().map(|l| strip_list_marker(l.trim())).collect()
        } else {
            sentence_spans(text, section.span.clone()).into_iter().map(|s| &text[s]).collect()
        };

        for (position, sentence) in units.into_iter().enumerate() {
            let word_count = sentence.split_whitespace().count();
            if !KEY_POINT_WORDS.contains(&word_count) {
                continue;
            }

            let density: f64 = words(sentence)
                .map(|w| w.to_lowercase())
                .filter_map(|w| frequencies.get(&w))
                .map(|f| *f as f64 / max_frequency)
                .sum::<f64>()
                / word_count as f64;

            let mut score = density + 0.3 / (position as f64 + 1.0);
            if section_index == 0 && position == 0 {
                score += 0.2;
            }

            let normalized = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
            candidates.push((candidates.len(), score, normalized));
        }
    }

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
    candidates.truncate(max);
    candidates.sort_by_key(|(order, _, _)| *order);
    candidates.into_iter().map(|(_, _, sentence)| sentence).collect()
}

fn text_quality(text: &str, confidence: f32) -> f32 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let clean = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || ".,;:!?'\"()-%/&|".contains(*c))
        .count();
    let clean_ratio = clean as f32 / total as f32;
    (0.6 * clean_ratio + 0.4 * confidence).clamp(0.0, 1.0)
}

fn structure_complexity(structure: &StructuredData) -> f32 {
    let sections = (structure.sections.len() as f32 / 20.0).min(1.0);
    let tables = (structure.tables.len() as f32 / 4.0).min(1.0);

    let mut kinds: Vec<SectionKind> = structure.sections.iter().map(|s| s.kind).collect();
    kinds.sort_by_key(|k| *k as u8);
    kinds.dedup();
    let variety = kinds.len().saturating_sub(1) as f32 / 2.0;

    (0.5 * sections + 0.3 * tables + 0.2 * variety).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    const REPORT: &str = "# Annual Report\n\
        The cooperative expanded its solar programme to four new villages this year. \
        Solar capacity doubled while maintenance costs fell.\n\
        \n\
        Highlights:\n\
        - Four villages connected\n\
        - Maintenance costs down twelve percent\n\
        \n\
        Region | Panels | Output\n\
        North | 120 | 48\n\
        South | 90 | 36\n\
        \n\
        Next year the cooperative plans to train local technicians in solar repair.";

    fn extraction(text: &str) -> ExtractionResult {
        ExtractionResult::success(text, 1.0)
    }

    #[test]
    fn test_rejects_failed_extraction() {
        let analyzer = StructuralAnalyzer::default();
        let err = analyzer.analyze(&ExtractionResult::failure("scanner jammed")).unwrap_err();
        assert_eq!(err, AppError::invalid_input("scanner jammed"));
    }

    #[test]
    fn test_rejects_blank_and_short_text() {
        let analyzer = StructuralAnalyzer::default();
        assert!(matches!(analyzer.analyze(&extraction("  \n ")), Err(AppError::InvalidInput { .. })));
        assert_eq!(
            analyzer.analyze(&extraction("Too short.")).unwrap_err(),
            AppError::TextTooShort { min: 50, actual: 10 }
        );
    }

    #[test]
    fn test_sections_and_titles() {
        let structure = StructuralAnalyzer::default().structure(REPORT);
        let titles: Vec<_> = structure.sections.iter().map(|s| s.title.as_deref()).collect();
        assert_eq!(titles, vec![Some("Annual Report"), Some("Highlights"), None, None]);

        let kinds: Vec<_> = structure.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SectionKind::Paragraph, SectionKind::List, SectionKind::Table, SectionKind::Paragraph]
        );

        assert!(REPORT[structure.sections[0].span.clone()].starts_with("The cooperative"));
        for pair in structure.sections.windows(2) {
            assert!(pair[0].span.end <= pair[1].start());
        }
    }

    #[test]
    fn test_table_detection() {
        let structure = StructuralAnalyzer::default().structure(REPORT);
        assert_eq!(structure.tables.len(), 1);

        let table = &structure.tables[0];
        assert_eq!((table.rows, table.columns, table.delimiter), (3, 3, '|'));
        assert!(REPORT[table.span.clone()].starts_with("Region"));
        assert!(REPORT[table.span.clone()].ends_with("36"));
    }

    #[test]
    fn test_comma_prose_is_not_a_table() {
        let text = "Apples, pears, and plums grew well.\nOats, rye, and barley did not.\nBeans, peas, and lentils were late.";
        assert!(detect_tables(text).is_empty());

        let csv = "name,score,rank\nada,97,1\nalan,95,2";
        assert_eq!(detect_tables(csv).len(), 1);
    }

    #[test]
    fn test_key_points_in_source_order() {
        let analyzer = StructuralAnalyzer::new(AnalyzerConfig { min_text_chars: 50, max_key_points: 2 });
        let structure = analyzer.structure(REPORT);

        assert_eq!(structure.key_points.len(), 2);
        let positions: Vec<_> = structure
            .key_points
            .iter()
            .map(|k| REPORT.replace('\n', " ").find(k.as_str()).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        assert!(structure.key_points[0].starts_with("The cooperative expanded"));
    }

    #[test]
    fn test_text_without_structure_has_one_section() {
        let text = "just a long stream of lowercase words without any punctuation or breaks at all here";
        let structure = StructuralAnalyzer::default().structure(text);
        assert_eq!(structure.sections.len(), 1);
        assert_eq!(structure.sections[0].span, 0..text.len());
    }

    #[test]
    fn test_metrics_in_range() {
        let analysis = StructuralAnalyzer::default().analyze(&extraction(REPORT)).unwrap();
        let metrics = &analysis.metrics;
        assert!((0.0..=1.0).contains(&metrics.text_quality));
        assert!((0.0..=1.0).contains(&metrics.structure_complexity));
        assert!(metrics.structure_complexity > 0.0);
        assert_eq!(metrics.extraction_time, Duration::ZERO);

        let timed = analysis.with_extraction_time(Duration::from_millis(5));
        assert_eq!(timed.metrics.extraction_time, Duration::from_millis(5));
    }

    #[test]
    fn test_custom_classifier() {
        struct Fixed;
        impl TextClassifier for Fixed {
            fn document_type(&self, _: &str, _: &[Section], _: &[TableRegion]) -> DocumentType {
                DocumentType::Technical
            }
            fn reading_level(&self, _: &str) -> crate::models::ReadingLevel {
                crate::models::ReadingLevel::Advanced
            }
            fn language(&self, _: &str) -> String {
                "xx".to_string()
            }
        }

        let analyzer = StructuralAnalyzer::default().with_classifier(Arc::new(Fixed));
        let structure = analyzer.structure(REPORT);
        assert_eq!(structure.document_type, DocumentType::Technical);
        assert_eq!(structure.language, "xx");
    }

    #[test]
    fn test_list_entries_are_separate_candidates() {
        let text = "Steps:\n- Download the installer from the project page\n- Run the installer with default options";
        let structure = StructuralAnalyzer::default().structure(text);
        assert_eq!(
            structure.key_points,
            vec![
                "Download the installer from the project page".to_string(),
                "Run the installer with default options".to_string(),
            ]
        );
    }

    #[test]
    fn test_is_heading() {
        assert!(is_heading("# Intro"));
        assert!(is_heading("RESULTS"));
        assert!(is_heading("2.1 Field Trials"));
        assert!(is_heading("Summary of Findings"));
        assert!(is_heading("Notes:"));
        assert!(!is_heading("This is a sentence."));
        assert!(!is_heading("- list entry"));
        assert!(!is_heading("1. first step"));
        assert!(!is_heading("a | b"));
    }
}
