//! Guardian Proxy - interception middleware and reverse-proxy forwarding.
//!
//! This crate turns any axum router into an intercepting proxy for AI
//! completion traffic. A cooperating client hook redirects its outbound
//! completion calls to the proxy's listener and marks each one with a
//! header naming the true destination; the middleware analyzes the body,
//! blocks policy violations, and reverse-proxies everything else verbatim.
//!
//! ## Architecture
//!
//! ```text
//! Client Request → Listener → Completion path + marker header?
//!                                      │
//!                    ┌─────────────────┴─────────────────┐
//!                    │ No                                │ Yes
//!                    ▼                                   ▼
//!               Next handler                     Extract body text
//!              (pass-through)                            │
//!                                                        ▼
//!                                                Analyze + decide
//!                                                        │
//!                                       ┌────────────────┴────────────────┐
//!                                       │ Allow                           │ Block
//!                                       ▼                                 ▼
//!                               Forward to marked                   403 fixed body
//!                               destination, relay                 (no downstream
//!                               response verbatim                      call)
//!                                       │                                 │
//!                                       └────────────┬────────────────────┘
//!                                                    ▼
//!                                        One telemetry event
//! ```
//!
//! ## Marker protocol
//!
//! - `x-guardian-original-destination`: the true destination URL
//!   (scheme + host + path + query). Required for interception.
//! - `x-guardian-user-id`: optional caller identity.
//! - `x-forwarded-for`: optional client IP; its first hop wins.
//!
//! Marker headers are stripped before forwarding; on the happy path the
//! destination receives byte-identical body content.

pub mod endpoints;
pub mod error;
pub mod forward;
pub mod gate;
pub mod headers;
pub mod identity;
pub mod middleware;
pub mod payload;
pub mod telemetry;

pub use endpoints::is_completion_path;
pub use error::{ProxyError, Result};
pub use forward::{ForwardedResponse, Forwarder};
pub use gate::{ClientGate, DenyList, OpenGate};
pub use middleware::{intercept, InterceptState, ACCESS_DENIED_MESSAGE, BLOCK_MESSAGE};
pub use payload::{ChatMessage, RequestPayload};
pub use telemetry::{
    estimate_cost, estimate_tokens, MemorySink, NullSink, TelemetryEvent, TelemetrySink,
    TracingSink,
};

/// Default proxy port.
pub const DEFAULT_PROXY_PORT: u16 = 8080;
