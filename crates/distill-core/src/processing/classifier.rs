//! Document classification heuristics
//!
//! Classification sits behind `TextClassifier` so the analyzer and the rest of
//! the pipeline can be exercised with a fixed classifier in tests.

use super::{blocks, sentence_spans, words};
use crate::models::{DocumentType, ReadingLevel, Section, SectionKind, TableRegion};

/// Classifies text as a whole
pub trait TextClassifier: Send + Sync {
    fn document_type(&self, text: &str, sections: &[Section], tables: &[TableRegion]) -> DocumentType;

    fn reading_level(&self, text: &str) -> ReadingLevel;

    /// BCP 47 primary language tag, `und` when undetermined
    fn language(&self, text: &str) -> String;
}

const ENGLISH: &[&str] = &[
    "the", "and", "of", "to", "is", "in", "that", "it", "for", "with", "was", "on", "are", "this",
    "be", "as", "by", "not",
];
const SPANISH: &[&str] = &[
    "el", "la", "de", "que", "y", "los", "las", "en", "por", "con", "una", "es", "del", "para",
    "se", "no",
];
const FRENCH: &[&str] = &[
    "le", "la", "les", "de", "et", "des", "est", "une", "que", "pour", "dans", "un", "du", "en",
    "pas", "au",
];
const GERMAN: &[&str] = &[
    "der", "die", "und", "das", "ist", "nicht", "mit", "den", "ein", "eine", "zu", "von", "sich",
    "auch", "auf", "dem",
];

const LANGUAGES: &[(&str, &[&str])] =
    &[("en", ENGLISH), ("es", SPANISH), ("fr", FRENCH), ("de", GERMAN)];

const TECHNICAL_TERMS: &[&str] = &[
    "algorithm", "api", "configuration", "parameter", "function", "protocol", "database", "server",
    "install", "version", "module", "interface", "implementation", "compile", "query", "network",
    "specification", "latency", "throughput", "variable",
];

/// Whether a lowercase word is a stop word in any supported language
pub fn is_stop_word(word: &str) -> bool {
    LANGUAGES.iter().any(|(_, list)| list.contains(&word))
}

/// Rule-based classifier over simple lexical statistics
#[derive(Debug, Clone, Default)]
pub struct HeuristicClassifier;

impl TextClassifier for HeuristicClassifier {
    fn document_type(&self, text: &str, sections: &[Section], tables: &[TableRegion]) -> DocumentType {
        let total_chars = text.chars().filter(|c| !c.is_whitespace()).count();
        if total_chars == 0 {
            return DocumentType::Unknown;
        }

        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        if (letters as f64) / (total_chars as f64) < 0.3 && tables.is_empty() {
            return DocumentType::Unknown;
        }

        let trimmed_len = text.trim().len().max(1) as f64;
        let table_bytes: usize = tables.iter().map(|t| t.span.len()).sum();
        let table_ratio = table_bytes as f64 / trimmed_len;
        if table_ratio >= 0.6 {
            return DocumentType::Tabular;
        }
        if table_ratio >= 0.15 {
            return DocumentType::Mixed;
        }

        let tokens: Vec<String> = words(text).map(|w| w.to_lowercase()).collect();
        let word_count = tokens.len().max(1) as f64;

        let code_chars = text.chars().filter(|c| "{}[]();=<>_/\\#@$".contains(*c)).count();
        let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
        let term_hits = tokens.iter().filter(|t| TECHNICAL_TERMS.contains(&t.as_str())).count();
        let list_sections = sections.iter().filter(|s| s.kind == SectionKind::List).count();

        let code_ratio = code_chars as f64 / total_chars as f64;
        let digit_ratio = digits as f64 / total_chars as f64;
        let term_ratio = term_hits as f64 / word_count;
        let list_ratio = if sections.is_empty() {
            0.0
        } else {
            list_sections as f64 / sections.len() as f64
        };

        let signals = [code_ratio > 0.02, digit_ratio > 0.08, term_ratio > 0.03, list_ratio > 0.5]
            .iter()
            .filter(|s| **s)
            .count();

        match signals {
            0 => DocumentType::Narrative,
            1 if list_ratio > 0.5 => DocumentType::Mixed,
            _ => DocumentType::Technical,
        }
    }

    fn reading_level(&self, text: &str) -> ReadingLevel {
        let sentences: usize = blocks(text)
            .into_iter()
            .map(|block| sentence_spans(text, block).len())
            .sum();
        let tokens: Vec<&str> = words(text).collect();

        if sentences == 0 || tokens.is_empty() {
            return ReadingLevel::Basic;
        }

        let avg_sentence = tokens.len() as f64 / sentences as f64;
        let long_words = tokens.iter().filter(|w| w.chars().count() >= 8).count();
        let long_ratio = long_words as f64 / tokens.len() as f64;

        if avg_sentence >= 25.0 || long_ratio >= 0.28 || (avg_sentence >= 18.0 && long_ratio >= 0.18) {
            ReadingLevel::Advanced
        } else if avg_sentence >= 14.0 || long_ratio >= 0.15 {
            ReadingLevel::Intermediate
        } else {
            ReadingLevel::Basic
        }
    }

    fn language(&self, text: &str) -> String {
        let tokens: Vec<String> = words(text).map(|w| w.to_lowercase()).collect();
        if tokens.is_empty() {
            return "und".to_string();
        }

        let votes: Vec<(&str, usize)> = LANGUAGES
            .iter()
            .map(|(tag, list)| (*tag, tokens.iter().filter(|t| list.contains(&t.as_str())).count()))
            .collect();

        let best = votes.iter().map(|(_, v)| *v).max().unwrap_or(0);
        let leaders: Vec<&str> = votes.iter().filter(|(_, v)| *v == best).map(|(t, _)| *t).collect();

        let enough = best >= 2 && (best as f64) >= tokens.len() as f64 * 0.05;
        if enough && leaders.len() == 1 {
            leaders[0].to_string()
        } else {
            "und".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(kind: SectionKind, span: std::ops::Range<usize>) -> Section {
        Section { title: None, kind, heading_span: None, span }
    }

    #[test]
    fn test_language_detection() {
        let classifier = HeuristicClassifier;
        assert_eq!(classifier.language("The cat sat on the mat and it was happy with the day."), "en");
        assert_eq!(classifier.language("El perro de la casa come con los niños y las niñas."), "es");
        assert_eq!(classifier.language("Le chat est dans la maison et les enfants sont au jardin."), "fr");
        assert_eq!(classifier.language("Der Hund ist nicht mit dem Kind auf der Straße und die Katze auch."), "de");
        assert_eq!(classifier.language("12345 67890"), "und");
    }

    #[test]
    fn test_reading_level() {
        let classifier = HeuristicClassifier;
        assert_eq!(classifier.reading_level("The dog ran. It was fast. We all saw it."), ReadingLevel::Basic);

        let advanced = "Notwithstanding considerable methodological heterogeneity, \
                        comprehensive longitudinal investigations consistently demonstrate \
                        statistically significant associations between socioeconomic \
                        disadvantage and cardiovascular morbidity.";
        assert_eq!(classifier.reading_level(advanced), ReadingLevel::Advanced);
    }

    #[test]
    fn test_tabular_document() {
        let text = "a | b\n1 | 2\n3 | 4";
        let tables = vec![TableRegion { span: 0..text.len(), rows: 3, columns: 2, delimiter: '|' }];
        let sections = vec![section(SectionKind::Table, 0..text.len())];
        assert_eq!(HeuristicClassifier.document_type(text, &sections, &tables), DocumentType::Tabular);
    }

    #[test]
    fn test_narrative_and_technical() {
        let narrative = "She walked along the river at dawn. The water was calm and grey.";
        let sections = vec![section(SectionKind::Paragraph, 0..narrative.len())];
        assert_eq!(HeuristicClassifier.document_type(narrative, &sections, &[]), DocumentType::Narrative);

        let technical = "Set the timeout parameter in config.toml (default = 30). \
                         The server retries each query with exponential backoff.";
        let sections = vec![section(SectionKind::Paragraph, 0..technical.len())];
        assert_eq!(HeuristicClassifier.document_type(technical, &sections, &[]), DocumentType::Technical);
    }

    #[test]
    fn test_unknown_for_symbol_noise() {
        let noise = "#### ---- 1234 5678 //// ==== 9999";
        assert_eq!(HeuristicClassifier.document_type(noise, &[], &[]), DocumentType::Unknown);
        assert_eq!(HeuristicClassifier.document_type("   ", &[], &[]), DocumentType::Unknown);
    }

    #[test]
    fn test_stop_words() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("und"));
        assert!(!is_stop_word("river"));
    }
}
