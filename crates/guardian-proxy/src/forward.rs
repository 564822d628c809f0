//! Reverse-proxy forwarding to the declared true destination.
//!
//! The outgoing request reuses the caller's method, headers (minus the
//! marker headers and connection plumbing), and the exact body bytes that
//! were received. The downstream response is captured whole so its status
//! and size can be recorded before it is relayed unchanged.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use reqwest::Url;

use crate::error::{ProxyError, Result};
use crate::headers::STRIPPED_HEADERS;

/// Hop-by-hop headers that must not be relayed in either direction.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// A captured downstream response.
#[derive(Debug)]
pub struct ForwardedResponse {
    /// Downstream status code.
    pub status: StatusCode,
    /// Downstream headers, minus hop-by-hop entries.
    pub headers: HeaderMap,
    /// The complete downstream body.
    pub body: Bytes,
}

/// Reverse proxy client.
///
/// No total request timeout is imposed on the outbound call: the forward is
/// bounded only by the destination's own response time. Embedders that need
/// a bound can inject a preconfigured [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Creates a forwarder with a default client.
    ///
    /// Redirects are not followed: a 3xx from the destination is relayed to
    /// the caller like any other response.
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build forwarding client");
        Self { client }
    }

    /// Creates a forwarder around an existing client (e.g. one carrying a
    /// timeout or proxy configuration).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Parses a destination marker value into a URL.
    ///
    /// Only absolute http/https URLs with a host are accepted.
    pub fn parse_destination(raw: &str) -> Result<Url> {
        let url = Url::parse(raw).map_err(|e| ProxyError::BadDestination(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProxyError::BadDestination(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ProxyError::BadDestination("missing host".to_string()));
        }
        Ok(url)
    }

    /// Sends the request to its true destination and captures the response.
    pub async fn forward(
        &self,
        method: Method,
        destination: Url,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<ForwardedResponse> {
        let outgoing = filter_request_headers(headers);

        let response = self
            .client
            .request(method, destination)
            .headers(outgoing)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = filter_response_headers(response.headers());
        let body = response.bytes().await?;

        Ok(ForwardedResponse {
            status,
            headers,
            body,
        })
    }
}

impl Default for Forwarder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops marker headers plus anything the client stack recomputes.
fn filter_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in headers {
        let name_str = name.as_str();
        if STRIPPED_HEADERS.contains(&name_str)
            || HOP_BY_HOP_HEADERS.contains(&name_str)
            || name_str == "host"
            || name_str == "content-length"
        {
            continue;
        }
        filtered.append(name, value.clone());
    }
    filtered
}

/// Drops hop-by-hop headers from the downstream response.
fn filter_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in headers {
        if HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            continue;
        }
        filtered.append(name, value.clone());
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    // ==================== Destination Parsing Tests ====================

    #[test]
    fn parses_absolute_http_url() {
        let url = Forwarder::parse_destination("http://backend:8080/v1/chat/completions").unwrap();
        assert_eq!(url.host_str(), Some("backend"));
        assert_eq!(url.path(), "/v1/chat/completions");
    }

    #[test]
    fn parses_query_string() {
        let url = Forwarder::parse_destination("https://backend/generate?stream=true").unwrap();
        assert_eq!(url.query(), Some("stream=true"));
    }

    #[test]
    fn rejects_relative_url() {
        assert!(Forwarder::parse_destination("/v1/completions").is_err());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(Forwarder::parse_destination("ftp://backend/file").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(Forwarder::parse_destination("not a url").is_err());
    }

    // ==================== Header Filtering Tests ====================

    #[test]
    fn strips_marker_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-guardian-original-destination",
            HeaderValue::from_static("http://backend/chat"),
        );
        headers.insert("x-guardian-user-id", HeaderValue::from_static("u1"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let filtered = filter_request_headers(&headers);
        assert!(!filtered.contains_key("x-guardian-original-destination"));
        assert!(!filtered.contains_key("x-guardian-user-id"));
        assert!(filtered.contains_key("content-type"));
    }

    #[test]
    fn strips_host_and_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("proxy.local"));
        headers.insert("content-length", HeaderValue::from_static("42"));
        let filtered = filter_request_headers(&headers);
        assert!(filtered.is_empty());
    }

    #[test]
    fn keeps_authorization_and_custom_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok"));
        headers.insert("x-request-id", HeaderValue::from_static("abc"));
        let filtered = filter_request_headers(&headers);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn response_filter_drops_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        let filtered = filter_response_headers(&headers);
        assert!(!filtered.contains_key("transfer-encoding"));
        assert!(filtered.contains_key("content-type"));
    }
}
