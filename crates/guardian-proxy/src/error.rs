//! Error types for the proxy.

use thiserror::Error;

/// Proxy error type.
///
/// All variants are per-request failures: they surface as an error response
/// to the one caller involved and never affect other in-flight requests.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The destination marker header was missing, unreadable, or not a URL.
    #[error("invalid destination marker: {0}")]
    BadDestination(String),

    /// The downstream destination could not be reached.
    #[error("upstream error: {0}")]
    Upstream(#[from] reqwest::Error),
}

/// Result type for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
