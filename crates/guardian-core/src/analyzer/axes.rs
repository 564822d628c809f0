//! Per-axis heuristic measurements.
//!
//! Each axis is an independent, order-insensitive pure function over the
//! lowercased text. Word-list axes scale their hit count by an axis weight
//! over the total word count; structural axes (PII, jailbreak intent) scale
//! a raw tally. Every result is clamped to the axis range.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::{
    BIASED_PHRASES, BIAS_WEIGHT, EMOTIONAL_WEIGHT, EMOTIONAL_WORDS, JAILBREAK_HIT_WEIGHT,
    JAILBREAK_PHRASES, MANIPULATIVE_PHRASES, MANIPULATIVE_WEIGHT, NEGATIVE_WORDS, PII_HIT_WEIGHT,
    PII_KEYWORDS, POSITIVE_WORDS, PROFANE_WORDS, PROFANITY_WEIGHT, TOXICITY_WEIGHT, TOXIC_WORDS,
};

/// Structural PII patterns: email, phone, SSN-shaped, credit-card-shaped,
/// street-address-shaped, URL.
static PII_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
        r"\b\d{3}-?\d{2}-?\d{4}\b",
        r"\b(?:\d{4}[-\s]?){4}|\d{4}[-\s]?\d{6}[-\s]?\d{5}\b",
        r"\b\d+\s+[a-zA-Z]+\s+(?:st|ave|rd|blvd|drive|street|avenue|road|boulevard)\b",
        r"https?://[^\s/$.?#].[^\s]*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid PII pattern"))
    .collect()
});

/// Higher-precision jailbreak patterns; each match counts double.
static JAILBREAK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)ignore (previous|prior|earlier|initial) instructions",
        r"(?i)pretend (to be|you are) (an|a) (unrestricted|unfiltered)",
        r"(?i)(bypass|ignore|circumvent) (ethics|restrictions|limitations|filters)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid jailbreak pattern"))
    .collect()
});

/// Patterns indicative of an outright jailbreak attempt, used by the
/// dedicated boolean probe.
static JAILBREAK_PROBE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)ignore (previous|prior) instructions",
        r"(?i)\b(system prompt|my previous instructions|my prior instructions)\b",
        r"(?i)\b(pretend|imagine|role-play|simulation).+?(ignore|forget|disregard).+?(instruction|prompt|rule)",
        r"(?i)\b(let's play a game|hypothetically speaking|in a fictional scenario)\b",
        r"(?i)bypass (safety|security|ethical|filter)",
        r"(?i)how (to|would|could) (hack|steal|attack|exploit)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid jailbreak probe pattern"))
    .collect()
});

/// Counts non-overlapping occurrences of each entry in the text.
fn occurrence_count(text: &str, entries: &[&str]) -> usize {
    entries.iter().map(|e| text.matches(e).count()).sum()
}

/// Scales a hit count into [0, 1] against the total word count.
fn scaled(hits: usize, weight: f64, total_words: usize) -> f64 {
    if total_words == 0 {
        return 0.0;
    }
    (hits as f64 * weight / total_words as f64).min(1.0)
}

/// Sentiment in [-1, 1]: (positive − negative) / (positive + negative),
/// neutral when neither list hits.
pub fn sentiment(text: &str) -> f64 {
    let positive = occurrence_count(text, POSITIVE_WORDS);
    let negative = occurrence_count(text, NEGATIVE_WORDS);
    if positive + negative == 0 {
        return 0.0;
    }
    (positive as f64 - negative as f64) / (positive + negative) as f64
}

/// Toxicity in [0, 1].
pub fn toxicity(text: &str, total_words: usize) -> f64 {
    scaled(occurrence_count(text, TOXIC_WORDS), TOXICITY_WEIGHT, total_words)
}

/// Profanity in [0, 1].
pub fn profanity(text: &str, total_words: usize) -> f64 {
    scaled(
        occurrence_count(text, PROFANE_WORDS),
        PROFANITY_WEIGHT,
        total_words,
    )
}

/// Bias in [0, 1].
pub fn bias(text: &str, total_words: usize) -> f64 {
    scaled(occurrence_count(text, BIASED_PHRASES), BIAS_WEIGHT, total_words)
}

/// Emotional charge in [0, 1].
pub fn emotional(text: &str, total_words: usize) -> f64 {
    scaled(
        occurrence_count(text, EMOTIONAL_WORDS),
        EMOTIONAL_WEIGHT,
        total_words,
    )
}

/// Manipulative phrasing in [0, 1].
pub fn manipulative(text: &str, total_words: usize) -> f64 {
    scaled(
        occurrence_count(text, MANIPULATIVE_PHRASES),
        MANIPULATIVE_WEIGHT,
        total_words,
    )
}

/// PII likelihood in [0, 1]: structural pattern matches plus lexicon hits,
/// each hit scaled by 0.25.
pub fn pii(text: &str) -> f64 {
    let mut hits = 0usize;
    for pattern in PII_PATTERNS.iter() {
        hits += pattern.find_iter(text).count();
    }
    for keyword in PII_KEYWORDS {
        if text.contains(keyword) {
            hits += 1;
        }
    }
    (hits as f64 * PII_HIT_WEIGHT).min(1.0)
}

/// Jailbreak intent in [0, 1]: phrase containment counts +1 each, the
/// higher-precision patterns +2 each, scaled by 0.2.
pub fn jailbreak_intent(text: &str) -> f64 {
    let mut tally = 0usize;
    for phrase in JAILBREAK_PHRASES {
        if text.contains(phrase) {
            tally += 1;
        }
    }
    for pattern in JAILBREAK_PATTERNS.iter() {
        if pattern.is_match(text) {
            tally += 2;
        }
    }
    (tally as f64 * JAILBREAK_HIT_WEIGHT).min(1.0)
}

/// Returns true if the text matches any outright jailbreak pattern.
pub fn is_jailbreak_attempt(text: &str) -> bool {
    JAILBREAK_PROBE_PATTERNS.iter().any(|p| p.is_match(text))
}
