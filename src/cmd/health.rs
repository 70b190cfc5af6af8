//! `servergate health` — probe a running gateway.
//!
//! Fetches `/health` from the given base URL and prints either the raw
//! JSON or a short summary of uptime, config and request counters.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::cli::HealthArgs;
use crate::error::GatewayError;
use crate::health::HealthResponse;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn execute(args: HealthArgs) -> Result<(), GatewayError> {
    let body = fetch_health(&args.url).await?;
    let text = String::from_utf8_lossy(&body);

    if args.json {
        println!("{text}");
        return Ok(());
    }

    match serde_json::from_str::<HealthResponse>(&text) {
        Ok(health) => {
            println!("\u{2713} servergate is healthy ({})", args.url);
            for line in summary(&health) {
                println!("  {line}");
            }
        }
        Err(e) => {
            eprintln!("Unexpected /health payload: {e}");
            println!("{text}");
        }
    }
    Ok(())
}

/// `GET {base}/health`, failing on transport errors and non-2xx answers.
async fn fetch_health(base: &str) -> Result<Bytes, GatewayError> {
    let http_err = |e: Box<dyn std::error::Error + Send + Sync>| GatewayError::HttpRequest { source: e };

    let uri: hyper::Uri = format!("{}/health", base.trim_end_matches('/'))
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| GatewayError::UriParse {
            source: Box::new(e),
        })?;

    let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
    let request = hyper::Request::get(uri)
        .body(Full::new(Bytes::new()))
        .map_err(|e| http_err(Box::new(e)))?;

    let response = tokio::time::timeout(PROBE_TIMEOUT, client.request(request))
        .await
        .map_err(|_| http_err(format!("no answer within {}s", PROBE_TIMEOUT.as_secs()).into()))?
        .map_err(|e| http_err(Box::new(e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::HealthCheckFailed(status));
    }

    Ok(response
        .into_body()
        .collect()
        .await
        .map_err(|e| http_err(Box::new(e)))?
        .to_bytes())
}

fn summary(health: &HealthResponse) -> Vec<String> {
    let config = &health.config;
    vec![
        format!("uptime:   {}", format_uptime(health.uptime_seconds)),
        format!(
            "config:   {} @ {} (loaded {}s ago, {} reloads)",
            config.source, config.version, config.loaded_ago_seconds, health.stats.config_reloads
        ),
        format!("cockpit:  {}", config.cockpit_upstream),
        format!("routes:   {}", config.routes.join(", ")),
        format!(
            "requests: {} forwarded, {} failed",
            health.stats.requests_forwarded, health.stats.requests_failed
        ),
    ]
}

fn format_uptime(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m {s}s"),
    }
}
