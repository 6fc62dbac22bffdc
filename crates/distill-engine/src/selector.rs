//! Processing strategy selection
//!
//! Text length picks a bracket (SINGLE, DUAL or MULTI). When the bracket's
//! request estimate does not fit the remaining daily quota, a single
//! quota-constrained fallback over the leading part of the text is offered
//! instead.

use distill_core::models::{ProcessingOption, ProcessingStrategy, RateLimitStatus, StructuredData};

/// Longest text summarized in one request
pub const SINGLE_MAX_CHARS: usize = 30_000;

/// Longest text handled as two chunks plus consolidation
pub const DUAL_MAX_CHARS: usize = 100_000;

/// Target characters per chunk for MULTI
pub const MULTI_CHUNK_CHARS: usize = 25_000;

pub const MULTI_MIN_CHUNKS: usize = 4;
pub const MULTI_MAX_CHUNKS: usize = 6;

/// Stateless strategy selector
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategySelector;

impl StrategySelector {
    /// Options for a text of `text_len` characters, recommended option first.
    ///
    /// Always returns at least one option.
    pub fn select(
        text_len: usize,
        structure: &StructuredData,
        status: &RateLimitStatus,
    ) -> Vec<ProcessingOption> {
        let option = Self::bracket_option(text_len, structure);

        if status.can_afford(option.estimated_requests) {
            tracing::debug!(
                strategy = %option.strategy,
                requests = option.estimated_requests,
                remaining = status.remaining(),
                "Selected processing strategy"
            );
            return vec![option];
        }

        tracing::info!(
            strategy = %option.strategy,
            requests = option.estimated_requests,
            remaining = status.remaining(),
            "Strategy does not fit remaining quota, offering single-request fallback"
        );
        vec![Self::quota_constrained(text_len, status)]
    }

    /// The option for a text's length bracket, ignoring quota
    pub fn bracket_option(text_len: usize, structure: &StructuredData) -> ProcessingOption {
        let sections = structure.sections.len();

        if text_len <= SINGLE_MAX_CHARS {
            ProcessingOption {
                strategy: ProcessingStrategy::Single,
                estimated_requests: 1,
                benefits: vec![
                    "Fastest result".to_string(),
                    "Uses one request".to_string(),
                    "The model sees the whole text at once".to_string(),
                ],
                drawbacks: Vec::new(),
                recommended: true,
                quota_constrained: false,
                chunk_count: 1,
                consolidate: false,
                input_limit: None,
            }
        } else if text_len <= DUAL_MAX_CHARS {
            let mut drawbacks = vec!["Uses three requests".to_string()];
            if !structure.tables.is_empty() {
                drawbacks.push("A table may be split between the two halves".to_string());
            }
            ProcessingOption {
                strategy: ProcessingStrategy::Dual,
                estimated_requests: 3,
                benefits: vec![
                    "Covers the full text".to_string(),
                    "A final pass merges both halves into one summary".to_string(),
                ],
                drawbacks,
                recommended: true,
                quota_constrained: false,
                chunk_count: 2,
                consolidate: true,
                input_limit: None,
            }
        } else {
            let chunks = multi_chunk_count(text_len);
            let mut benefits = vec![
                "Covers the full text".to_string(),
                format!("Summarizes {} parts two at a time", chunks),
            ];
            if sections >= chunks {
                benefits.push(format!("Parts follow the document's {} sections", sections));
            }
            ProcessingOption {
                strategy: ProcessingStrategy::Multi,
                estimated_requests: chunks as u32,
                benefits,
                drawbacks: vec![
                    format!("Uses {} requests", chunks),
                    "Part summaries are joined without a merging pass".to_string(),
                ],
                recommended: true,
                quota_constrained: false,
                chunk_count: chunks,
                consolidate: false,
                input_limit: None,
            }
        }
    }

    fn quota_constrained(text_len: usize, status: &RateLimitStatus) -> ProcessingOption {
        let truncated = text_len > SINGLE_MAX_CHARS;

        let mut drawbacks = Vec::new();
        if truncated {
            drawbacks.push(format!(
                "Only the first {} characters are summarized",
                SINGLE_MAX_CHARS
            ));
        }
        if !status.can_afford(1) {
            drawbacks.push(format!("Daily limit reached, resets at {}", status.reset_at));
        }

        ProcessingOption {
            strategy: ProcessingStrategy::Single,
            estimated_requests: 1,
            benefits: vec![format!("Fits the {} remaining requests today", status.remaining())],
            drawbacks,
            recommended: true,
            quota_constrained: true,
            chunk_count: 1,
            consolidate: false,
            input_limit: truncated.then_some(SINGLE_MAX_CHARS),
        }
    }
}

/// `ceil(len / MULTI_CHUNK_CHARS)` clamped to the MULTI chunk range
fn multi_chunk_count(text_len: usize) -> usize {
    text_len.div_ceil(MULTI_CHUNK_CHARS).clamp(MULTI_MIN_CHUNKS, MULTI_MAX_CHUNKS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn status(used: u32) -> RateLimitStatus {
        RateLimitStatus {
            requests_used: used,
            daily_cap: 50,
            reset_at: Utc.with_ymd_and_hms(2026, 6, 2, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_short_text_is_single() {
        let options = StrategySelector::select(12_000, &StructuredData::unknown(), &status(0));
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].strategy, ProcessingStrategy::Single);
        assert_eq!(options[0].estimated_requests, 1);
        assert!(options[0].recommended);
        assert!(!options[0].quota_constrained);
    }

    #[test]
    fn test_bracket_edges() {
        let structure = StructuredData::unknown();
        assert_eq!(StrategySelector::bracket_option(30_000, &structure).strategy, ProcessingStrategy::Single);
        assert_eq!(StrategySelector::bracket_option(30_001, &structure).strategy, ProcessingStrategy::Dual);
        assert_eq!(StrategySelector::bracket_option(100_000, &structure).strategy, ProcessingStrategy::Dual);
        assert_eq!(StrategySelector::bracket_option(100_001, &structure).strategy, ProcessingStrategy::Multi);
    }

    #[test]
    fn test_dual_includes_consolidation_request() {
        let option = StrategySelector::bracket_option(80_000, &StructuredData::unknown());
        assert_eq!(option.estimated_requests, 3);
        assert_eq!(option.plan().max_requests(), 3);
    }

    #[test]
    fn test_multi_chunk_count_is_clamped() {
        assert_eq!(multi_chunk_count(100_001), 5);
        assert_eq!(multi_chunk_count(120_000), 5);
        assert_eq!(multi_chunk_count(140_000), 6);
        assert_eq!(multi_chunk_count(400_000), 6);
        assert_eq!(multi_chunk_count(80_000), 4);
    }

    #[test]
    fn test_quota_constrained_fallback() {
        // Three requests left, MULTI needs six
        let options = StrategySelector::select(150_000, &StructuredData::unknown(), &status(47));
        assert_eq!(options.len(), 1);

        let option = &options[0];
        assert_eq!(option.strategy, ProcessingStrategy::Single);
        assert_eq!(option.estimated_requests, 1);
        assert!(option.quota_constrained);
        assert!(option.recommended);
        assert_eq!(option.input_limit, Some(SINGLE_MAX_CHARS));
    }

    #[test]
    fn test_dual_excluded_with_two_requests_left() {
        // 50,000 chars needs DUAL's three requests; only two remain
        let options = StrategySelector::select(50_000, &StructuredData::unknown(), &status(48));
        assert_eq!(options.len(), 1);
        assert!(options.iter().all(|o| o.strategy != ProcessingStrategy::Dual));

        let option = &options[0];
        assert_eq!(option.strategy, ProcessingStrategy::Single);
        assert_eq!(option.estimated_requests, 1);
        assert!(option.quota_constrained);
        assert_eq!(option.input_limit, Some(SINGLE_MAX_CHARS));
    }

    #[test]
    fn test_exhausted_quota_still_offers_option() {
        let options = StrategySelector::select(5_000, &StructuredData::unknown(), &status(50));
        assert_eq!(options.len(), 1);
        assert!(options[0].quota_constrained);
        assert_eq!(options[0].input_limit, None);
        assert!(options[0].drawbacks.iter().any(|d| d.contains("Daily limit reached")));
    }

    #[test]
    fn test_exact_fit_is_not_constrained() {
        let options = StrategySelector::select(80_000, &StructuredData::unknown(), &status(47));
        assert_eq!(options[0].strategy, ProcessingStrategy::Dual);
        assert!(!options[0].quota_constrained);
    }
}
