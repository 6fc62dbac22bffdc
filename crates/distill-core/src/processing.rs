pub mod analyzer;
pub mod chunk;
pub mod classifier;

use std::ops::Range;

pub use analyzer::{Analysis, AnalyzerConfig, StructuralAnalyzer};
pub use chunk::{partition, truncate_at_sentence, ChunkBoundary, TextChunk};
pub use classifier::{HeuristicClassifier, TextClassifier};

/// Lines of `text` as byte spans, line terminators excluded
pub(crate) fn lines(text: &str) -> Vec<(Range<usize>, &str)> {
    let mut out = Vec::new();
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        out.push((offset..offset + line.len(), line));
        offset += raw.len();
    }
    out
}

/// Maximal runs of non-blank lines, as byte spans
pub(crate) fn blocks(text: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for (span, line) in lines(text) {
        if line.trim().is_empty() {
            if let Some(block) = current.take() {
                out.push(block);
            }
        } else {
            match current.as_mut() {
                Some(block) => block.end = span.end,
                None => current = Some(span),
            }
        }
    }

    if let Some(block) = current {
        out.push(block);
    }
    out
}

/// Sentence spans inside `range`, leading whitespace excluded.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace, or at the end
/// of the range.
pub(crate) fn sentence_spans(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let slice = &text[range.clone()];
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut chars = slice.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if start.is_none() {
            if c.is_whitespace() {
                continue;
            }
            start = Some(i);
        }

        let terminal = matches!(c, '.' | '!' | '?');
        let at_break = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if terminal && at_break {
            if let Some(s) = start.take() {
                spans.push(range.start + s..range.start + i + c.len_utf8());
            }
        }
    }

    if let Some(s) = start {
        let end = slice.trim_end().len();
        spans.push(range.start + s..range.start + end);
    }
    spans
}

/// Word tokens: alphanumeric runs, apostrophes kept
pub(crate) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
}
