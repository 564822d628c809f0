//! Blocking decision over analysis results.
//!
//! The policy compares the composite score against a configurable
//! threshold, with fixed hard overrides for axes considered unconditionally
//! disqualifying: a near-certain toxicity, jailbreak, or PII signal blocks
//! even when averaging keeps the composite score low.

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisResult;

/// Default composite-score threshold for automatic blocking.
pub const DEFAULT_AUTO_BLOCK_THRESHOLD: f64 = 0.85;

/// Hard override: toxicity above this always blocks.
const TOXICITY_OVERRIDE: f64 = 0.9;

/// Hard override: jailbreak intent above this always blocks.
const JAILBREAK_OVERRIDE: f64 = 0.85;

/// Hard override: PII above this always blocks.
const PII_OVERRIDE: f64 = 0.9;

/// The blocking policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Composite score at or above which a request is blocked.
    pub auto_block_threshold: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            auto_block_threshold: DEFAULT_AUTO_BLOCK_THRESHOLD,
        }
    }
}

impl Policy {
    /// Creates a policy with the given threshold.
    pub fn with_threshold(auto_block_threshold: f64) -> Self {
        Self {
            auto_block_threshold,
        }
    }

    /// Decides whether the analyzed content should be blocked.
    pub fn should_block(&self, result: &AnalysisResult) -> bool {
        if result.score >= self.auto_block_threshold {
            return true;
        }

        result.metrics.toxicity > TOXICITY_OVERRIDE
            || result.metrics.jailbreak_intent > JAILBREAK_OVERRIDE
            || result.metrics.pii > PII_OVERRIDE
    }
}
