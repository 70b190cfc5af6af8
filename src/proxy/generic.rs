//! Generic proxy: forwards to a URL named in the query string.
//!
//! The target is `target` when present, otherwise `serverUrl` followed by
//! `endpoint`. The upstream's status, content type and body (as text) are
//! returned with open CORS headers. Request bodies are sent as JSON text
//! whatever their declared content type.

use std::time::{Duration, Instant};

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, Request};
use axum::response::Response;
use bytes::Bytes;
use url::form_urlencoded;

use super::upstream::{self, Upstream};
use super::{describe, headers, json_error, relay, Inbound};
use crate::config::model::ProxyConfig;
use crate::error::ProxyError;

/// Resolve the upstream URL from the raw query string.
///
/// Empty values count as absent. When a key repeats, the first value wins.
pub fn resolve_target(query: Option<&str>) -> Result<String, ProxyError> {
    let mut target = None;
    let mut server_url = None;
    let mut endpoint = None;

    for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
        let slot = match key.as_ref() {
            "target" => &mut target,
            "serverUrl" => &mut server_url,
            "endpoint" => &mut endpoint,
            _ => continue,
        };
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value.into_owned());
        }
    }

    if let Some(target) = target {
        return Ok(target);
    }
    server_url
        .map(|server| format!("{server}{}", endpoint.unwrap_or_default()))
        .ok_or(ProxyError::MissingTarget)
}

/// Body to send upstream. JSON bodies are re-emitted compactly; anything
/// else becomes a JSON string literal of its text. GET and HEAD send none.
#[must_use]
pub fn reserialize_body(method: &Method, body: &Bytes) -> Option<Bytes> {
    if method == Method::GET || method == Method::HEAD || body.is_empty() {
        return None;
    }
    let value = serde_json::from_slice::<serde_json::Value>(body).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
    });
    Some(Bytes::from(value.to_string()))
}

pub async fn handle(
    upstream: &dyn Upstream,
    config: &ProxyConfig,
    timeout: Option<Duration>,
    inbound: &Inbound<'_>,
) -> Result<Response, Response> {
    let target = match resolve_target(inbound.uri.query()) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(
                correlation_id = %inbound.correlation_id,
                query = inbound.uri.query().unwrap_or(""),
                "proxy request without target"
            );
            return Err(json_error(e.status(), &e.to_string(), None, &[]));
        }
    };

    tracing::info!(
        correlation_id = %inbound.correlation_id,
        method = %inbound.method,
        target = %target,
        "proxy request"
    );

    let start = Instant::now();
    match forward(upstream, config, timeout, inbound, &target).await {
        Ok(upstream_response) => {
            tracing::info!(
                correlation_id = %inbound.correlation_id,
                status = upstream_response.status().as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "proxy target responded"
            );
            Ok(build_response(upstream_response, inbound.correlation_id))
        }
        Err(e) => {
            let message = describe(&e);
            tracing::error!(
                correlation_id = %inbound.correlation_id,
                target = %target,
                error = %message,
                latency_ms = start.elapsed().as_millis() as u64,
                "proxy error"
            );
            Err(json_error(
                e.status(),
                "Failed to connect to server",
                Some(message),
                &[("targetUrl", target.as_str())],
            ))
        }
    }
}

async fn forward(
    upstream: &dyn Upstream,
    config: &ProxyConfig,
    timeout: Option<Duration>,
    inbound: &Inbound<'_>,
    target: &str,
) -> Result<axum::http::Response<Bytes>, ProxyError> {
    let uri = upstream::parse_target(target)?;
    let body = reserialize_body(inbound.method, inbound.body).unwrap_or_default();

    let mut request = Request::builder()
        .method(inbound.method.clone())
        .uri(uri)
        .body(body)?;
    *request.headers_mut() = headers::generic_request_headers(inbound.headers, config);

    upstream::send_with_timeout(upstream, request, timeout).await
}

fn build_response(upstream_response: axum::http::Response<Bytes>, correlation_id: &str) -> Response {
    let (parts, body) = upstream_response.into_parts();
    let text = String::from_utf8_lossy(&body).into_owned();
    let mut response = relay(parts.status, text);
    let out = response.headers_mut();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
    out.insert(CONTENT_TYPE, content_type);
    headers::apply_open_cors(out);
    headers::set_correlation_id(out, correlation_id);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn explicit_target_wins() {
        let target = resolve_target(Some(
            "serverUrl=http%3A%2F%2Fother&target=http%3A%2F%2Fexample.com%2Fa",
        ))
        .unwrap();
        assert_eq!(target, "http://example.com/a");
    }

    #[test]
    fn server_url_and_endpoint_are_joined() {
        let target =
            resolve_target(Some("serverUrl=http://5.78.70.68:8080&endpoint=/status")).unwrap();
        assert_eq!(target, "http://5.78.70.68:8080/status");

        let bare = resolve_target(Some("serverUrl=http://5.78.70.68:8080")).unwrap();
        assert_eq!(bare, "http://5.78.70.68:8080");
    }

    #[test]
    fn missing_target_is_rejected() {
        assert!(matches!(resolve_target(None), Err(ProxyError::MissingTarget)));
        assert!(matches!(
            resolve_target(Some("endpoint=/status")),
            Err(ProxyError::MissingTarget)
        ));
        assert!(matches!(
            resolve_target(Some("target=&serverUrl=")),
            Err(ProxyError::MissingTarget)
        ));
    }

    #[test]
    fn first_non_empty_value_wins() {
        let target = resolve_target(Some("target=http://a/&target=http://b/")).unwrap();
        assert_eq!(target, "http://a/");
    }

    #[test]
    fn json_body_is_compacted() {
        let body = Bytes::from_static(b"{ \"name\" : \"web\",\n \"replicas\": 2 }");
        let sent = reserialize_body(&Method::POST, &body).unwrap();
        assert_eq!(sent, Bytes::from_static(br#"{"name":"web","replicas":2}"#));
    }

    #[test]
    fn non_json_body_becomes_json_string() {
        let body = Bytes::from_static(b"a=1&b=2");
        let sent = reserialize_body(&Method::PUT, &body).unwrap();
        assert_eq!(sent, Bytes::from_static(br#""a=1&b=2""#));
    }

    #[test]
    fn get_and_empty_bodies_are_not_sent() {
        let body = Bytes::from_static(b"{}");
        assert!(reserialize_body(&Method::GET, &body).is_none());
        assert!(reserialize_body(&Method::HEAD, &body).is_none());
        assert!(reserialize_body(&Method::POST, &Bytes::new()).is_none());
    }

    #[test]
    fn response_keeps_upstream_content_type_and_adds_cors() {
        let upstream_response = axum::http::Response::builder()
            .status(404)
            .header(CONTENT_TYPE, "application/json")
            .header("set-cookie", "session=1")
            .body(Bytes::from_static(br#"{"missing":true}"#))
            .unwrap();

        let response = build_response(upstream_response, "cid");
        let h = response.headers();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(h[CONTENT_TYPE], "application/json");
        assert_eq!(h["access-control-allow-origin"], "*");
        assert_eq!(h["access-control-allow-methods"], headers::ALLOWED_METHODS);
        assert!(h.get("set-cookie").is_none());
    }
}
