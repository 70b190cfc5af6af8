//! Request dispatch and the two proxy handlers.
//!
//! [`dispatch_handler`] is the Axum fallback that receives every
//! non-`/health` request, takes a snapshot of the current config, and
//! hands the request to the [`cockpit`] handler, the [`generic`] handler,
//! or the [`consoles`](crate::consoles) link builder. Browser preflights
//! to either proxy route are answered here and never reach a handler.
//! Handlers return `Ok` when an upstream answered (whatever its status)
//! and `Err` with a ready-made JSON error response otherwise, so dispatch
//! can keep the forwarded / failed counters.

pub mod cockpit;
pub mod generic;
pub mod headers;
pub mod routing;
pub mod upstream;

use std::error::Error as _;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::consoles;
use crate::error::ProxyError;
use crate::server::AppState;
use routing::RouteKind;

/// The parts of an inbound request a handler needs.
#[derive(Debug)]
pub struct Inbound<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub body: &'a Bytes,
    pub correlation_id: &'a str,
}

impl Inbound<'_> {
    #[must_use]
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), |pq| pq.as_str())
    }
}

pub async fn dispatch_handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Clone the Arc<Config> (cheap refcount bump) to release the RwLock before .await
    let config = Arc::clone(&state.config.read().await.config);

    let path = uri.path();
    let Some(kind) = routing::match_route(&config, path) else {
        tracing::debug!(method = %method, path = %path, "no route matched");
        return StatusCode::NOT_FOUND.into_response();
    };

    // Preflights are answered here and not counted.
    if method == Method::OPTIONS && kind != RouteKind::Consoles {
        return preflight();
    }

    let correlation_id = headers::correlation_id(&req_headers);
    let inbound = Inbound {
        method: &method,
        uri: &uri,
        headers: &req_headers,
        body: &body,
        correlation_id: &correlation_id,
    };
    let timeout = config.defaults.timeout.map(Duration::from_millis);

    let outcome = match kind {
        RouteKind::Cockpit => {
            cockpit::handle(state.upstream.as_ref(), &config.cockpit, timeout, &inbound).await
        }
        RouteKind::Generic => {
            generic::handle(state.upstream.as_ref(), &config.proxy, timeout, &inbound).await
        }
        RouteKind::Consoles => return consoles::handle(&config, &method, uri.query()),
    };

    match outcome {
        Ok(response) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            response
        }
        Err(response) => {
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            response
        }
    }
}

/// Empty 200 carrying the fixed preflight CORS headers.
#[must_use]
pub fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    headers::apply_preflight_cors(response.headers_mut());
    response
}

/// Error text including every distinct cause in the source chain.
///
/// hyper's top-level errors are terse ("client error (Connect)"); the
/// useful part ("Connection refused") sits a few sources down.
#[must_use]
pub fn describe(err: &ProxyError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// JSON error body with the given status. `context` fields are merged in.
pub fn json_error(
    status: StatusCode,
    error: &str,
    message: Option<String>,
    context: &[(&str, &str)],
) -> Response {
    let mut body = serde_json::Map::new();
    body.insert("error".into(), error.into());
    if let Some(message) = message {
        body.insert("message".into(), message.into());
    }
    for (key, value) in context {
        body.insert((*key).into(), (*value).into());
    }
    (status, Json(serde_json::Value::Object(body))).into_response()
}

/// Build a response from relayed parts without any fallible builder step.
pub fn relay(status: StatusCode, body: impl Into<Body>) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_walks_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = ProxyError::BodyRead {
            source: Box::new(io),
        };
        assert_eq!(
            describe(&err),
            "failed to read upstream body: Connection refused"
        );
    }

    #[test]
    fn describe_does_not_repeat_transparent_sources() {
        let err = ProxyError::Upstream {
            source: "connection reset".into(),
        };
        assert_eq!(describe(&err), "connection reset");
    }

    #[test]
    fn preflight_is_empty_ok() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().len(), 4);
    }

    #[test]
    fn inbound_prefers_path_and_query() {
        let uri: Uri = "/api/cockpit/x?y=1".parse().unwrap();
        let inbound = Inbound {
            method: &Method::GET,
            uri: &uri,
            headers: &HeaderMap::new(),
            body: &Bytes::new(),
            correlation_id: "id",
        };
        assert_eq!(inbound.path_and_query(), "/api/cockpit/x?y=1");
    }
}
