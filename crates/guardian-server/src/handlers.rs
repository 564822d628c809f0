//! Internal HTTP handlers.

use axum::Json;
use serde_json::{json, Value};

/// Crate version reported by the liveness endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Liveness probe: `GET /_guardian/health`.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION,
    }))
}
