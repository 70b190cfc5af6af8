//! Header construction for both directions of a proxied request.
//!
//! Outbound requests never clone the client's header map: each handler
//! builds a curated set ([`cockpit_request_headers`],
//! [`generic_request_headers`]) so hop-by-hop and origin-specific headers
//! never leak upstream. Responses get the permissive CORS headers that
//! let the dashboard call the gateway from any origin.

use axum::http::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, ACCESS_CONTROL_ALLOW_CREDENTIALS,
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    AUTHORIZATION, CONTENT_TYPE, COOKIE, HOST, USER_AGENT,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::config::model::{CockpitConfig, ProxyConfig};

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const PREFLIGHT_ALLOWED_HEADERS: &str = "Content-Type, Authorization, Cookie";
pub const PROXY_ALLOWED_HEADERS: &str = "Content-Type, Authorization";

pub const CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

/// Copy `name` from `incoming`, or fall back to `default` when absent.
fn passthrough_or(headers: &mut HeaderMap, incoming: &HeaderMap, name: HeaderName, default: &str) {
    if let Some(value) = incoming.get(&name) {
        headers.insert(name, value.clone());
    } else if let Ok(value) = HeaderValue::from_str(default) {
        headers.insert(name, value);
    } else {
        tracing::warn!(header = %name, "invalid default header value, skipping");
    }
}

fn passthrough(headers: &mut HeaderMap, incoming: &HeaderMap, name: HeaderName) {
    if let Some(value) = incoming.get(&name) {
        headers.insert(name, value.clone());
    }
}

/// Headers sent to the Cockpit upstream.
///
/// `Accept-Encoding` is pinned to `identity` so the body can be relayed
/// byte for byte without re-deriving `Content-Encoding`.
pub fn cockpit_request_headers(
    method: &Method,
    incoming: &HeaderMap,
    upstream_authority: &str,
    config: &CockpitConfig,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(host) = HeaderValue::from_str(upstream_authority) {
        headers.insert(HOST, host);
    }
    passthrough_or(&mut headers, incoming, USER_AGENT, &config.user_agent);
    passthrough_or(&mut headers, incoming, ACCEPT, &config.accept);
    passthrough_or(&mut headers, incoming, ACCEPT_LANGUAGE, &config.accept_language);
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    passthrough(&mut headers, incoming, COOKIE);
    passthrough(&mut headers, incoming, AUTHORIZATION);
    if method != Method::GET {
        passthrough(&mut headers, incoming, CONTENT_TYPE);
    }

    headers
}

/// Headers sent by the generic proxy. Cookie and Authorization are never forwarded.
pub fn generic_request_headers(incoming: &HeaderMap, config: &ProxyConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();

    passthrough_or(&mut headers, incoming, CONTENT_TYPE, &config.content_type);
    match HeaderValue::from_str(&config.user_agent) {
        Ok(value) => {
            headers.insert(USER_AGENT, value);
        }
        Err(_) => tracing::warn!("invalid proxy user agent, skipping"),
    }
    passthrough_or(&mut headers, incoming, ACCEPT, &config.accept);

    headers
}

/// The fixed CORS answer to a browser preflight.
pub fn apply_preflight_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(PREFLIGHT_ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

/// CORS headers on a relayed Cockpit response (cookies must be accepted).
pub fn apply_credentialed_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

/// CORS headers on a relayed generic proxy response.
pub fn apply_open_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(PROXY_ALLOWED_HEADERS),
    );
}

/// Reuse the caller's correlation id when it sent one.
pub fn correlation_id(incoming: &HeaderMap) -> String {
    incoming
        .get(&CORRELATION_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from)
}

pub fn set_correlation_id(headers: &mut HeaderMap, correlation_id: &str) {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID, value);
    }
}
