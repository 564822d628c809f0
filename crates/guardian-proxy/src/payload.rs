//! Completion payload sniffing.
//!
//! Request bodies arrive as raw bytes; a schema-sniffing step at the
//! boundary decides between the two recognized shapes and everything after
//! operates on the strongly-typed variant. Unrecognized bodies are not an
//! error: they simply yield no analyzable text.

use serde::{Deserialize, Serialize};

/// One message of a chat completion payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The message role (`system`, `user`, `assistant`, ...).
    pub role: String,
    /// The message text.
    pub content: String,
}

/// A recognized AI completion payload.
///
/// Decided by shape: a `messages` array means chat, a `prompt` string means
/// legacy completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPayload {
    /// Chat completion: `{"messages": [{"role", "content"}, ...]}`.
    Chat {
        /// The conversation messages.
        messages: Vec<ChatMessage>,
    },
    /// Legacy completion: `{"prompt": "..."}`.
    Completion {
        /// The prompt text.
        prompt: String,
    },
}

impl RequestPayload {
    /// Sniffs a raw body into a typed payload. Returns `None` when the body
    /// is not JSON or matches neither recognized shape.
    pub fn sniff(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// Returns the text subject to analysis: the prompt, or all non-system
    /// message contents joined by newlines.
    pub fn analyzable_text(&self) -> String {
        match self {
            RequestPayload::Completion { prompt } => prompt.clone(),
            RequestPayload::Chat { messages } => {
                let texts: Vec<&str> = messages
                    .iter()
                    .filter(|m| m.role != "system")
                    .map(|m| m.content.as_str())
                    .collect();
                texts.join("\n")
            }
        }
    }
}

/// Sniffs a body and extracts its analyzable text, empty when the body has
/// no recognized completion shape.
pub fn analyzable_text(body: &[u8]) -> String {
    RequestPayload::sniff(body)
        .map(|payload| payload.analyzable_text())
        .unwrap_or_default()
}
