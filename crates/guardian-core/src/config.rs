//! Rules-document loading.
//!
//! Rules are consumed at startup from a JSON or YAML document of the form
//! `{"rules": [{"name", "pattern", "severity", "description"}, ...]}`.
//! Loading is deliberately forgiving: an unreadable file, an unparseable
//! document, or an empty rule list falls back to the built-in rule set with
//! a logged warning. The process must always start with a usable policy.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::rules::{RuleSet, RuleSpec};

/// The on-disk rules document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesDocument {
    /// Rule specs in document order.
    pub rules: Vec<RuleSpec>,
}

impl RulesDocument {
    /// Parses a document from raw bytes, honoring the path extension:
    /// `.json` parses as JSON, `.yaml`/`.yml` as YAML, anything else tries
    /// JSON first and falls back to YAML.
    pub fn parse(path: &Path, bytes: &[u8]) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_slice(bytes)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(bytes)?),
            _ => serde_json::from_slice(bytes)
                .map_err(CoreError::from)
                .or_else(|_| serde_yaml::from_slice(bytes).map_err(CoreError::from)),
        }
    }

    /// Reads and parses the document at `path`.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(path, &bytes)
    }
}

/// Loads a rule set from an optional rules document path.
///
/// `None` yields the built-in set. A path that cannot be read or parsed
/// also yields the built-in set, with a warning; individual rules with
/// invalid patterns are dropped during compilation.
pub fn load_rules(path: Option<&Path>) -> RuleSet {
    let Some(path) = path else {
        info!("no rules document supplied, using built-in rule set");
        return RuleSet::builtin();
    };

    match RulesDocument::read(path) {
        Ok(doc) if doc.rules.is_empty() => {
            warn!(path = %path.display(), "rules document has no rules, using built-in rule set");
            RuleSet::builtin()
        }
        Ok(doc) => {
            let set = RuleSet::compile(doc.rules);
            info!(path = %path.display(), rules = set.len(), "loaded rules document");
            set
        }
        Err(e) => {
            warn!(path = %path.display(), "failed to load rules document ({e}), using built-in rule set");
            RuleSet::builtin()
        }
    }
}
