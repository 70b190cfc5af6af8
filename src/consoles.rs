//! Console link builder.
//!
//! The dashboard opens the VNC desktop and the web terminal in new
//! windows. Those live on their own ports on the managed server, so the
//! gateway only computes the URLs; it does not proxy them.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::model::{Config, ConsolesConfig};
use crate::proxy::json_error;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleLinks {
    pub host: String,
    pub desktop_url: String,
    pub terminal_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cockpit_url: Option<String>,
}

impl ConsoleLinks {
    #[must_use]
    pub fn for_host(host: &str, consoles: &ConsolesConfig, cockpit_prefix: Option<&str>) -> Self {
        Self {
            host: host.to_string(),
            desktop_url: format!(
                "http://{host}:{}{}",
                consoles.desktop_port, consoles.desktop_path
            ),
            terminal_url: format!("http://{host}:{}", consoles.terminal_port),
            cockpit_url: cockpit_prefix.map(|prefix| format!("{prefix}/")),
        }
    }
}

/// Host from the `host` query parameter, falling back to the configured one.
fn requested_host(query: Option<&str>, consoles: &ConsolesConfig) -> Option<String> {
    form_urlencoded::parse(query.unwrap_or("").as_bytes())
        .find(|(key, _)| key == "host")
        .map(|(_, value)| value.trim().to_string())
        .filter(|host| !host.is_empty())
        .or_else(|| consoles.host.clone().filter(|h| !h.is_empty()))
}

pub fn handle(config: &Config, method: &Method, query: Option<&str>) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let Some(host) = requested_host(query, &config.consoles) else {
        return json_error(StatusCode::BAD_REQUEST, "Server host is required", None, &[]);
    };

    let cockpit_prefix = config
        .cockpit
        .enabled
        .then_some(config.cockpit.prefix.as_str());
    Json(ConsoleLinks::for_host(&host, &config.consoles, cockpit_prefix)).into_response()
}
