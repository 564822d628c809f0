//! Client IP and user identification.
//!
//! Both are best-effort: interception must never fail because a caller did
//! not identify itself, so every extractor has an "unknown"/"anonymous"
//! fallback.

use axum::extract::ConnectInfo;
use axum::http::header::AUTHORIZATION;
use axum::http::{Extensions, HeaderMap};
use std::net::SocketAddr;

use crate::headers;

/// Fallback user identifier for unidentified callers.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Extracts the client IP: the first hop of `x-forwarded-for` when present,
/// else the peer socket address, else `"unknown"`.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return first_hop.to_string();
            }
        }
    }

    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Extracts a user identifier: the dedicated header, else one derived from
/// a bearer token, else [`ANONYMOUS_USER`].
pub fn user_id(headers: &HeaderMap) -> String {
    if let Some(id) = headers.get(headers::USER_ID).and_then(|v| v.to_str().ok()) {
        if !id.is_empty() {
            return id.to_string();
        }
    }

    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            // A stable prefix of the token identifies the caller without
            // recording the whole credential.
            let prefix: String = token.chars().take(8).collect();
            if !prefix.is_empty() {
                return format!("auth_{prefix}");
            }
        }
    }

    ANONYMOUS_USER.to_string()
}
