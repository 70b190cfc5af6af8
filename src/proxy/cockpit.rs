//! Cockpit console proxy.
//!
//! Everything under the configured prefix is forwarded to the Cockpit
//! upstream with the prefix removed. The response body is relayed byte
//! for byte, `Set-Cookie` passes through so the console session works,
//! and an absolute `Location` pointing at the upstream is rewritten back
//! onto the prefix so redirects never leave the gateway's origin.

use std::time::{Duration, Instant};

use axum::http::header::{CONTENT_TYPE, LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;

use super::upstream::{self, Upstream};
use super::{describe, headers, json_error, relay, Inbound};
use crate::config::model::CockpitConfig;
use crate::error::ProxyError;

/// Upstream URL for a request path: the prefix is stripped once and the
/// remainder (query included) appended to the upstream base.
#[must_use]
pub fn target_url(prefix: &str, upstream: &str, path_and_query: &str) -> String {
    let rest = path_and_query
        .strip_prefix(prefix)
        .unwrap_or(path_and_query);
    let base = upstream.trim_end_matches('/');
    if rest.is_empty() {
        format!("{base}/")
    } else if rest.starts_with('?') {
        format!("{base}/{rest}")
    } else {
        format!("{base}{rest}")
    }
}

/// Point an upstream redirect back at the gateway. Relative locations
/// and foreign hosts are left alone.
#[must_use]
pub fn rewrite_location(location: &str, upstream: &str, prefix: &str) -> String {
    location.replacen(upstream.trim_end_matches('/'), prefix, 1)
}

pub async fn handle(
    upstream: &dyn Upstream,
    config: &CockpitConfig,
    timeout: Option<Duration>,
    inbound: &Inbound<'_>,
) -> Result<Response, Response> {
    let base = config.upstream_base();
    let target = target_url(&config.prefix, base, inbound.path_and_query());

    tracing::info!(
        correlation_id = %inbound.correlation_id,
        method = %inbound.method,
        path = %inbound.uri.path(),
        target = %target,
        "cockpit request"
    );

    let start = Instant::now();
    match forward(upstream, config, timeout, inbound, &target).await {
        Ok(upstream_response) => {
            tracing::info!(
                correlation_id = %inbound.correlation_id,
                status = upstream_response.status().as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "cockpit responded"
            );
            Ok(build_response(upstream_response, config, inbound.correlation_id))
        }
        Err(e) => {
            let message = describe(&e);
            tracing::error!(
                correlation_id = %inbound.correlation_id,
                target = %target,
                error = %message,
                latency_ms = start.elapsed().as_millis() as u64,
                "cockpit proxy error"
            );
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to connect to Cockpit",
                Some(message),
                &[("cockpitUrl", base)],
            ))
        }
    }
}

async fn forward(
    upstream: &dyn Upstream,
    config: &CockpitConfig,
    timeout: Option<Duration>,
    inbound: &Inbound<'_>,
    target: &str,
) -> Result<axum::http::Response<Bytes>, ProxyError> {
    let uri = upstream::parse_target(target)?;
    let authority = uri.authority().map_or("", |a| a.as_str()).to_string();

    let body = if inbound.method == Method::GET {
        Bytes::new()
    } else {
        inbound.body.clone()
    };

    let mut request = Request::builder()
        .method(inbound.method.clone())
        .uri(uri)
        .body(body)?;
    *request.headers_mut() =
        headers::cockpit_request_headers(inbound.method, inbound.headers, &authority, config);

    upstream::send_with_timeout(upstream, request, timeout).await
}

fn build_response(
    upstream_response: axum::http::Response<Bytes>,
    config: &CockpitConfig,
    correlation_id: &str,
) -> Response {
    let (parts, body) = upstream_response.into_parts();
    let mut response = relay(parts.status, body);
    let out = response.headers_mut();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("text/html"));
    out.insert(CONTENT_TYPE, content_type);
    headers::apply_credentialed_cors(out);

    for cookie in parts.headers.get_all(SET_COOKIE) {
        out.append(SET_COOKIE, cookie.clone());
    }

    if let Some(location) = parts.headers.get(LOCATION) {
        let rewritten = location
            .to_str()
            .ok()
            .map(|loc| rewrite_location(loc, config.upstream_base(), &config.prefix))
            .and_then(|loc| HeaderValue::from_str(&loc).ok())
            .unwrap_or_else(|| location.clone());
        out.insert(LOCATION, rewritten);
    }

    headers::set_correlation_id(out, correlation_id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPSTREAM: &str = "http://5.78.70.68:9090";

    #[test]
    fn strips_prefix_once() {
        assert_eq!(
            target_url("/api/cockpit", UPSTREAM, "/api/cockpit/system"),
            "http://5.78.70.68:9090/system"
        );
        assert_eq!(
            target_url("/api/cockpit", UPSTREAM, "/api/cockpit/api/cockpit"),
            "http://5.78.70.68:9090/api/cockpit"
        );
    }

    #[test]
    fn bare_prefix_maps_to_root() {
        assert_eq!(
            target_url("/api/cockpit", UPSTREAM, "/api/cockpit"),
            "http://5.78.70.68:9090/"
        );
        assert_eq!(
            target_url("/api/cockpit", UPSTREAM, "/api/cockpit?login=1"),
            "http://5.78.70.68:9090/?login=1"
        );
    }

    #[test]
    fn query_is_preserved() {
        assert_eq!(
            target_url("/api/cockpit", "http://h:9090/", "/api/cockpit/a/b?c=d&e"),
            "http://h:9090/a/b?c=d&e"
        );
    }

    #[test]
    fn absolute_upstream_location_is_rewritten() {
        assert_eq!(
            rewrite_location("http://5.78.70.68:9090/foo", UPSTREAM, "/api/cockpit"),
            "/api/cockpit/foo"
        );
    }

    #[test]
    fn other_locations_are_untouched() {
        assert_eq!(
            rewrite_location("/cockpit/login", UPSTREAM, "/api/cockpit"),
            "/cockpit/login"
        );
        assert_eq!(
            rewrite_location("https://elsewhere.example/x", UPSTREAM, "/api/cockpit"),
            "https://elsewhere.example/x"
        );
    }

    #[test]
    fn response_relays_cookies_and_defaults_content_type() {
        let upstream_response = axum::http::Response::builder()
            .status(302)
            .header(SET_COOKIE, "cockpit=1; Path=/")
            .header(SET_COOKIE, "theme=dark")
            .header(LOCATION, "http://5.78.70.68:9090/system")
            .header("server", "cockpit-ws")
            .body(Bytes::new())
            .unwrap();

        let response = build_response(upstream_response, &CockpitConfig::default(), "cid");
        let h = response.headers();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(h[CONTENT_TYPE], "text/html");
        assert_eq!(h[LOCATION], "/api/cockpit/system");
        assert_eq!(h.get_all(SET_COOKIE).iter().count(), 2);
        assert_eq!(h["access-control-allow-origin"], "*");
        assert_eq!(h["access-control-allow-credentials"], "true");
        assert_eq!(h["x-correlation-id"], "cid");
        assert!(h.get("server").is_none());
    }
}
