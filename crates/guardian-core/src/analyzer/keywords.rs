//! Category keyword extraction.
//!
//! Tokenizes the text, counts word frequencies, and records a confidence
//! for every category keyword present. Keys are `category:term`; the map is
//! ordered so downstream telemetry attributes are deterministic.

use std::collections::BTreeMap;
use std::collections::HashMap;

use super::lexicon::{KEYWORD_CATEGORIES, KEYWORD_FREQUENCY_WEIGHT};

/// Punctuation stripped from token edges before counting.
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', ';', ':', '"', '\'', '(', ')', '[', ']', '{', '}',
];

/// Extracts category keywords with frequency-scaled confidences.
///
/// Only words longer than three characters are counted; confidence is
/// `min(1.0, frequency × 0.3)`.
pub fn extract(text: &str) -> BTreeMap<String, f64> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for token in text.split_whitespace() {
        let word = token.trim_matches(EDGE_PUNCTUATION).to_lowercase();
        if word.len() > 3 {
            *frequencies.entry(word).or_insert(0) += 1;
        }
    }

    let mut keywords = BTreeMap::new();
    for (category, terms) in KEYWORD_CATEGORIES {
        for term in *terms {
            if let Some(&count) = frequencies.get(*term) {
                let confidence = (count as f64 * KEYWORD_FREQUENCY_WEIGHT).min(1.0);
                keywords.insert(format!("{category}:{term}"), confidence);
            }
        }
    }
    keywords
}
