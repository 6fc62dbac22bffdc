//! Partitioning of source text into request-sized chunks

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::{blocks, sentence_spans};
use crate::models::StructuredData;

/// Preferred place to cut text between chunks.
///
/// When the preferred rule yields too few cut points, finer rules are
/// consulted in order (section, paragraph, sentence). Cuts never fall
/// inside a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkBoundary {
    Section,
    Paragraph,
    Sentence,
}

/// A contiguous slice of source text sent as one summarization request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of this chunk in source order
    pub index: usize,

    /// Byte span in the source text
    pub span: Range<usize>,

    pub text: String,
}

/// Split `text` into at most `count` chunks that cover it in source order.
///
/// Spans are contiguous and together cover the whole text. Fewer chunks are
/// returned when there are not enough boundaries to cut at.
pub fn partition(
    text: &str,
    structure: &StructuredData,
    count: usize,
    boundary: ChunkBoundary,
) -> Vec<TextChunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let count = count.max(1);
    let candidates = cut_candidates(text, structure, count - 1, boundary);
    let cuts = choose_cuts(text.len(), &candidates, count - 1);

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for end in cuts.into_iter().chain(std::iter::once(text.len())) {
        chunks.push(TextChunk {
            index: chunks.len(),
            span: start..end,
            text: text[start..end].trim().to_string(),
        });
        start = end;
    }

    tracing::debug!(requested = count, produced = chunks.len(), ?boundary, "Partitioned text");
    chunks
}

/// Leading part of `text` holding at most `max_chars` characters, cut at the
/// last sentence end that fits (or the last whitespace if no sentence does)
pub fn truncate_at_sentence(text: &str, max_chars: usize) -> &str {
    if text.chars().count() <= max_chars {
        return text;
    }

    let limit = text.char_indices().nth(max_chars).map_or(text.len(), |(i, _)| i);

    let sentence_end = blocks(text)
        .into_iter()
        .flat_map(|block| sentence_spans(text, block))
        .map(|span| span.end)
        .take_while(|&end| end <= limit)
        .last();

    let end = sentence_end
        .or_else(|| text[..limit].rfind(char::is_whitespace))
        .filter(|&end| end > 0)
        .unwrap_or(limit);

    text[..end].trim_end()
}

/// Sorted, de-duplicated cut offsets, refined until at least `needed` exist
fn cut_candidates(
    text: &str,
    structure: &StructuredData,
    needed: usize,
    boundary: ChunkBoundary,
) -> Vec<usize> {
    let rules: &[ChunkBoundary] = match boundary {
        ChunkBoundary::Section => {
            &[ChunkBoundary::Section, ChunkBoundary::Paragraph, ChunkBoundary::Sentence]
        }
        ChunkBoundary::Paragraph => &[ChunkBoundary::Paragraph, ChunkBoundary::Sentence],
        ChunkBoundary::Sentence => &[ChunkBoundary::Sentence],
    };

    let mut candidates = Vec::new();
    for rule in rules {
        let found: Vec<usize> = match rule {
            ChunkBoundary::Section => structure.section_boundaries(),
            ChunkBoundary::Paragraph => blocks(text).into_iter().skip(1).map(|b| b.start).collect(),
            ChunkBoundary::Sentence => blocks(text)
                .into_iter()
                .flat_map(|block| sentence_spans(text, block))
                .skip(1)
                .map(|s| s.start)
                .collect(),
        };

        candidates.extend(found.into_iter().filter(|&c| c > 0 && c < text.len()));
        candidates.sort_unstable();
        candidates.dedup();

        if candidates.len() >= needed {
            break;
        }
    }
    candidates
}

/// Pick up to `needed` cuts nearest to evenly spaced targets
fn choose_cuts(len: usize, candidates: &[usize], needed: usize) -> Vec<usize> {
    if candidates.len() <= needed {
        return candidates.to_vec();
    }

    let slots = needed + 1;
    let mut cuts = Vec::with_capacity(needed);
    let mut lower = 0;

    for k in 1..=needed {
        let target = len * k / slots;
        // leave enough candidates for the remaining cuts
        let upper = candidates.len() - (needed - k);

        let best = (lower..upper)
            .min_by_key(|&i| candidates[i].abs_diff(target))
            .unwrap_or(lower);

        cuts.push(candidates[best]);
        lower = best + 1;
    }
    cuts
}
