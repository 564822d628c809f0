//! Deterministic content analysis.
//!
//! The analyzer combines three independent layers into one composite risk
//! score:
//!
//! 1. The compiled [`RuleSet`](crate::rules::RuleSet), each match adding its
//!    severity weight.
//! 2. A sensitive-keyword substring scan, each distinct hit adding 0.2.
//! 3. Per-axis heuristics (sentiment, toxicity, PII, profanity, bias,
//!    emotional charge, manipulative phrasing, jailbreak intent) that can
//!    escalate the score when they cross their own thresholds.
//!
//! Analysis is a pure function of the input text: no I/O, no shared mutable
//! state, and it never fails — any input, including empty text, produces a
//! well-formed [`AnalysisResult`] with all metrics in range.

mod axes;
mod keywords;
mod lexicon;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::{MatchedRule, RuleSet};
use lexicon::{SENSITIVE_KEYWORDS, SENSITIVE_KEYWORD_WEIGHT};

/// Escalation threshold: toxicity above this raises the composite score.
const TOXICITY_ESCALATION: f64 = 0.7;

/// Escalation threshold: jailbreak intent above this raises the score.
const JAILBREAK_ESCALATION: f64 = 0.6;

/// Escalation threshold: PII above this raises the score to at least 0.8.
const PII_ESCALATION: f64 = 0.8;

/// Independent per-axis measurements of a text.
///
/// Sentiment ranges over [-1, 1]; every other axis over [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisMetrics {
    /// Sentiment: -1.0 (negative) to 1.0 (positive).
    pub sentiment: f64,
    /// Toxicity: 0.0 to 1.0.
    pub toxicity: f64,
    /// Personally identifiable information: 0.0 to 1.0.
    pub pii: f64,
    /// Profanity: 0.0 to 1.0.
    pub profanity: f64,
    /// Biased generalizations: 0.0 to 1.0.
    pub bias: f64,
    /// Emotionally charged language: 0.0 to 1.0.
    pub emotional: f64,
    /// Manipulative phrasing: 0.0 to 1.0.
    pub manipulative: f64,
    /// Jailbreak intent: 0.0 to 1.0.
    pub jailbreak_intent: f64,
}

/// Outcome of analyzing one text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Composite risk score in [0, 1].
    pub score: f64,
    /// Human-readable reasons, in match order.
    pub reasons: Vec<String>,
    /// Rules that matched, in rule-set order.
    pub matched_rules: Vec<MatchedRule>,
    /// Per-axis heuristic measurements.
    pub metrics: AxisMetrics,
    /// Extracted `category:term` keywords with confidences in [0, 1].
    pub keywords: BTreeMap<String, f64>,
}

impl AnalysisResult {
    /// The zero-risk result: score 0, no reasons, neutral metrics.
    pub fn clear() -> Self {
        Self::default()
    }

    /// Returns true if any rule matched.
    pub fn has_rule_matches(&self) -> bool {
        !self.matched_rules.is_empty()
    }
}

/// Analyzer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Whether analysis is performed at all. When disabled every text
    /// yields the zero-risk result.
    pub enabled: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The content analyzer.
///
/// Holds the compiled rule set; safe to share behind an `Arc` and call from
/// any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    rules: RuleSet,
}

impl Analyzer {
    /// Creates an analyzer over the given rule set.
    pub fn new(config: AnalyzerConfig, rules: RuleSet) -> Self {
        Self { config, rules }
    }

    /// Creates an analyzer with the built-in rule set.
    pub fn with_builtin_rules() -> Self {
        Self::new(AnalyzerConfig::default(), RuleSet::builtin())
    }

    /// Returns the rule set backing this analyzer.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Analyzes a text and returns its risk assessment.
    ///
    /// Pure and total: identical input always yields an identical result,
    /// and no input can make it fail.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        if !self.config.enabled || text.is_empty() {
            return AnalysisResult::clear();
        }

        let mut reasons = Vec::new();
        let mut matched_rules = Vec::new();
        let mut score = 0.0f64;

        // Layer 1: compiled rules against the raw text.
        for rule in self.rules.iter() {
            if rule.is_match(text) {
                reasons.push(format!(
                    "Matched rule '{}' (severity: {}): {}",
                    rule.name,
                    rule.severity.name(),
                    rule.description
                ));
                matched_rules.push(MatchedRule::from(rule));
                score += rule.severity.weight();
            }
        }

        // Layer 2: sensitive-keyword substring scan, first occurrence only.
        let lowercase = text.to_lowercase();
        for keyword in SENSITIVE_KEYWORDS {
            if lowercase.contains(keyword) {
                let reason = format!("Contains sensitive keyword: {keyword}");
                if !reasons.contains(&reason) {
                    reasons.push(reason);
                    score += SENSITIVE_KEYWORD_WEIGHT;
                }
            }
        }

        score = score.min(1.0);

        // Layer 3: per-axis heuristics over the lowercased text.
        let total_words = lowercase.split_whitespace().count();
        let metrics = AxisMetrics {
            sentiment: axes::sentiment(&lowercase),
            toxicity: axes::toxicity(&lowercase, total_words),
            pii: axes::pii(&lowercase),
            profanity: axes::profanity(&lowercase, total_words),
            bias: axes::bias(&lowercase, total_words),
            emotional: axes::emotional(&lowercase, total_words),
            manipulative: axes::manipulative(&lowercase, total_words),
            jailbreak_intent: axes::jailbreak_intent(&lowercase),
        };

        // Axis escalation can only raise the score, never lower it.
        if metrics.toxicity > TOXICITY_ESCALATION {
            reasons.push(format!("High toxicity detected: {:.2}", metrics.toxicity));
            score = score.max(metrics.toxicity);
        }
        if metrics.jailbreak_intent > JAILBREAK_ESCALATION {
            reasons.push(format!(
                "Jailbreak intent detected: {:.2}",
                metrics.jailbreak_intent
            ));
            score = score.max(metrics.jailbreak_intent);
        }
        if metrics.pii > PII_ESCALATION {
            reasons.push(format!("PII detected: {:.2}", metrics.pii));
            score = score.max(PII_ESCALATION);
        }

        AnalysisResult {
            score,
            reasons,
            matched_rules,
            metrics,
            keywords: keywords::extract(&lowercase),
        }
    }

    /// Returns true if the text matches a known jailbreak pattern outright,
    /// without running the full analysis.
    pub fn is_jailbreak_attempt(&self, text: &str) -> bool {
        axes::is_jailbreak_attempt(text)
    }
}
