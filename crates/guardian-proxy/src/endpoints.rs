//! Recognition of AI-completion endpoint shapes.
//!
//! The proxy only ever analyzes requests whose path looks like a chat or
//! text completion API call; everything else on the shared listener passes
//! through untouched.

use once_cell::sync::Lazy;
use regex::RegexSet;

/// Path patterns for AI completion endpoints. End-anchored so static assets
/// like `/chat.js` never match.
static COMPLETION_PATHS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)/v\d+/chat/completions$",
        r"(?i)/v\d+/completions$",
        r"(?i)/v\d+/generate$",
        r"(?i)/chat/completions$",
        r"(?i)/completions$",
        r"(?i)/generate$",
        r"(?i)/chat$",
    ])
    .expect("invalid completion path patterns")
});

/// Returns true if the path has an AI-completion endpoint shape.
pub fn is_completion_path(path: &str) -> bool {
    COMPLETION_PATHS.is_match(path)
}
