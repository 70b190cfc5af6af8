//! Serde data structures for the servergate configuration file.
//!
//! Contains [`Config`] (the root) and one section per served route:
//! [`CockpitConfig`], [`ProxyConfig`] and [`ConsolesConfig`], plus
//! [`Defaults`]. Every field has a default matching the stock deployment,
//! so an empty file (or no file at all) yields a working gateway.

use serde::{Deserialize, Serialize};

pub const DEFAULT_COCKPIT_PREFIX: &str = "/api/cockpit";
pub const DEFAULT_COCKPIT_UPSTREAM: &str = "http://5.78.70.68:9090";
pub const DEFAULT_BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const fn default_true() -> bool {
    true
}

fn default_cockpit_prefix() -> String {
    DEFAULT_COCKPIT_PREFIX.to_string()
}

fn default_cockpit_upstream() -> String {
    DEFAULT_COCKPIT_UPSTREAM.to_string()
}

fn default_browser_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_browser_accept() -> String {
    DEFAULT_BROWSER_ACCEPT.to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_proxy_path() -> String {
    "/api/proxy".to_string()
}

fn default_proxy_user_agent() -> String {
    "Hetzner-Dashboard-Proxy".to_string()
}

fn default_proxy_content_type() -> String {
    "text/html".to_string()
}

fn default_proxy_accept() -> String {
    "*/*".to_string()
}

fn default_consoles_path() -> String {
    "/api/consoles".to_string()
}

fn default_consoles_host() -> Option<String> {
    Some("5.78.70.68".to_string())
}

const fn default_desktop_port() -> u16 {
    6080
}

fn default_desktop_path() -> String {
    "/vnc.html".to_string()
}

const fn default_terminal_port() -> u16 {
    7681
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub cockpit: CockpitConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub consoles: ConsolesConfig,
}

impl Config {
    /// Paths served by the gateway, in dispatch order. Disabled sections are omitted.
    #[must_use]
    pub fn route_paths(&self) -> Vec<String> {
        let mut paths = Vec::with_capacity(3);
        if self.cockpit.enabled {
            paths.push(format!("{}/*", self.cockpit.prefix));
        }
        if self.proxy.enabled {
            paths.push(self.proxy.path.clone());
        }
        if self.consoles.enabled {
            paths.push(self.consoles.path.clone());
        }
        paths
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Upstream timeout in milliseconds. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CockpitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cockpit_prefix")]
    pub prefix: String,

    #[serde(default = "default_cockpit_upstream")]
    pub upstream: String,

    #[serde(default = "default_browser_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_browser_accept")]
    pub accept: String,

    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for CockpitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_cockpit_prefix(),
            upstream: default_cockpit_upstream(),
            user_agent: default_browser_user_agent(),
            accept: default_browser_accept(),
            accept_language: default_accept_language(),
        }
    }
}

impl CockpitConfig {
    /// Upstream base URL without a trailing slash.
    #[must_use]
    pub fn upstream_base(&self) -> &str {
        self.upstream.trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProxyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_proxy_path")]
    pub path: String,

    #[serde(default = "default_proxy_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_proxy_content_type")]
    pub content_type: String,

    #[serde(default = "default_proxy_accept")]
    pub accept: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_proxy_path(),
            user_agent: default_proxy_user_agent(),
            content_type: default_proxy_content_type(),
            accept: default_proxy_accept(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsolesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_consoles_path")]
    pub path: String,

    /// Host used when the request carries no `host` parameter.
    #[serde(default = "default_consoles_host")]
    pub host: Option<String>,

    #[serde(default = "default_desktop_port")]
    pub desktop_port: u16,

    #[serde(default = "default_desktop_path")]
    pub desktop_path: String,

    #[serde(default = "default_terminal_port")]
    pub terminal_port: u16,
}

impl Default for ConsolesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_consoles_path(),
            host: default_consoles_host(),
            desktop_port: default_desktop_port(),
            desktop_path: default_desktop_path(),
            terminal_port: default_terminal_port(),
        }
    }
}
