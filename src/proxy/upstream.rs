//! Outbound HTTP seam.
//!
//! Handlers never talk to hyper directly; they hand a fully built
//! [`Request`] to an [`Upstream`] and get back a response whose body has
//! already been buffered. [`HyperUpstream`] is the production
//! implementation over the shared connection-pooled client.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Request, Response, Uri};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use url::Url;

use crate::error::ProxyError;
use crate::server::HttpClient;

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Send `request` and buffer the whole response body.
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, ProxyError>;
}

pub struct HyperUpstream {
    client: HttpClient,
}

impl HyperUpstream {
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Upstream for HyperUpstream {
    async fn send(&self, request: Request<Bytes>) -> Result<Response<Bytes>, ProxyError> {
        let (parts, body) = request.into_parts();
        let request = hyper::Request::from_parts(parts, Full::new(body));

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ProxyError::Upstream {
                source: Box::new(e),
            })?;

        let (parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| ProxyError::BodyRead {
                source: Box::new(e),
            })?
            .to_bytes();

        Ok(Response::from_parts(parts, bytes))
    }
}

/// Send through `upstream`, giving up after `timeout` when one is set.
pub async fn send_with_timeout(
    upstream: &dyn Upstream,
    request: Request<Bytes>,
    timeout: Option<Duration>,
) -> Result<Response<Bytes>, ProxyError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, upstream.send(request))
            .await
            .map_err(|_| ProxyError::Timeout(limit))?,
        None => upstream.send(request).await,
    }
}

/// Parse an absolute `http`/`https` URL into a [`Uri`] the client can dial.
///
/// The target goes through WHATWG parsing first, so characters a URI cannot
/// carry (spaces, non-ASCII) are percent-encoded rather than rejected.
pub fn parse_target(target: &str) -> Result<Uri, ProxyError> {
    let invalid = |source: Box<dyn std::error::Error + Send + Sync>| ProxyError::InvalidTarget {
        target: target.to_string(),
        source,
    };

    let url = Url::parse(target).map_err(|e| invalid(Box::new(e)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'").into())),
    }
    if !url.has_host() {
        return Err(invalid("URL has no host".into()));
    }

    url.as_str()
        .parse()
        .map_err(|e: axum::http::uri::InvalidUri| invalid(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl Upstream for Stalled {
        async fn send(&self, _request: Request<Bytes>) -> Result<Response<Bytes>, ProxyError> {
            std::future::pending().await
        }
    }

    #[test]
    fn parses_absolute_http_targets() {
        let uri = parse_target("http://example.com/a?b=1").unwrap();
        assert_eq!(uri.host(), Some("example.com"));
        assert_eq!(uri.path_and_query().unwrap().as_str(), "/a?b=1");
    }

    #[test]
    fn rejects_relative_and_foreign_targets() {
        assert!(matches!(
            parse_target("/relative"),
            Err(ProxyError::InvalidTarget { .. })
        ));
        assert!(matches!(
            parse_target("ftp://example.com/file"),
            Err(ProxyError::InvalidTarget { .. })
        ));
        assert!(matches!(
            parse_target("not a url"),
            Err(ProxyError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn encodes_characters_a_uri_cannot_carry() {
        let uri = parse_target("http://example.com/search?q=a b").unwrap();
        assert_eq!(uri.to_string(), "http://example.com/search?q=a%20b");

        let uri = parse_target("http://10.0.0.5:8080/files/my doc.txt").unwrap();
        assert_eq!(uri.path(), "/files/my%20doc.txt");
        assert_eq!(uri.port_u16(), Some(8080));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_cuts_off_stalled_upstream() {
        let request = Request::new(Bytes::new());
        let err = send_with_timeout(&Stalled, request, Some(Duration::from_millis(250)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProxyError::Timeout(d) if d == Duration::from_millis(250)));
    }
}
