//! Product-number candidates from OCR text.
//!
//! Label photos contain care instructions, sizes, logos and prices next to
//! the product number. Product numbers in this catalog start with a fixed
//! letter (`M` by default), so extraction is a word-bounded pattern scan and
//! needs no understanding of the label layout.
//!
//! The scan is independent of the OCR engine that produced the text.

use regex::Regex;

/// Leading character(s) of every product number in the default catalog.
pub const DEFAULT_PREFIX: &str = "M";

/// Compiled candidate pattern for a given product-number prefix.
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    pattern: Regex,
    whitespace: Regex,
}

impl CandidateExtractor {
    /// Build an extractor for product numbers starting with `prefix`.
    ///
    /// The prefix is upper-cased and matched literally.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let prefix = regex::escape(&prefix.trim().to_uppercase());
        Ok(Self {
            pattern: Regex::new(&format!(r"\b{}[A-Z0-9-]{{4,}}\b", prefix))?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// All candidates in order of appearance. Empty when nothing matches.
    pub fn extract(&self, raw_text: &str) -> Vec<String> {
        let upper = raw_text.to_uppercase();
        let cleaned = self.whitespace.replace_all(&upper, " ");
        self.pattern
            .find_iter(&cleaned)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

impl Default for CandidateExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX).expect("default candidate pattern compiles")
    }
}

/// Extract candidates using the default `M` prefix.
pub fn extract_candidates(raw_text: &str) -> Vec<String> {
    CandidateExtractor::default().extract(raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_hyphenated_product_number() {
        assert_eq!(
            extract_candidates("wasabi M123-ABC size L"),
            vec!["M123-ABC".to_string()]
        );
    }

    #[test]
    fn no_candidate_is_empty_not_error() {
        assert!(extract_candidates("no product code here").is_empty());
    }

    #[test]
    fn multiline_text_keeps_order() {
        let text = "100% COTTON\nm24ts001\r\nmade in korea\n  M24-PT-777  ";
        assert_eq!(extract_candidates(text), vec!["M24TS001", "M24-PT-777"]);
    }

    #[test]
    fn requires_four_trailing_characters() {
        assert!(extract_candidates("M123 size M").is_empty());
        assert_eq!(extract_candidates("M1234"), vec!["M1234"]);
    }

    #[test]
    fn must_start_at_word_boundary() {
        assert!(extract_candidates("XM12345").is_empty());
    }

    #[test]
    fn custom_prefix() {
        let extractor = CandidateExtractor::new("k").unwrap();
        assert_eq!(extractor.extract("tag K9-0001 M12345"), vec!["K9-0001"]);
    }
}
