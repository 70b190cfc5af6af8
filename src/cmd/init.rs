//! `servergate init` — generate a starter configuration file.
//!
//! Writes a YAML, JSON, or TOML config that is either minimal (just the
//! Cockpit upstream) or complete with every option at its default.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::GatewayError;

pub fn execute(args: &InitArgs) -> Result<(), GatewayError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("servergate.{}", args.format.extension())));

    if output.exists() {
        return Err(GatewayError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# servergate config

cockpit:
  upstream: "http://5.78.70.68:9090"
"#;

const YAML_FULL: &str = r#"# servergate config
#
# All values shown are defaults. Remove what you do not change.

# Upstream timeout in ms. Leave unset to wait indefinitely.
# defaults:
#   timeout: 30000

# Cockpit console, served under a path prefix
cockpit:
  enabled: true
  prefix: "/api/cockpit"
  upstream: "http://5.78.70.68:9090"
  # Sent when the browser does not supply its own
  user_agent: "Mozilla/5.0"
  accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
  accept_language: "en-US,en;q=0.5"

# Generic proxy: /api/proxy?target=<url> or ?serverUrl=<url>&endpoint=<path>
proxy:
  enabled: true
  path: "/api/proxy"
  user_agent: "Hetzner-Dashboard-Proxy"
  content_type: "text/html"
  accept: "*/*"

# VNC desktop and web terminal links: /api/consoles?host=<ip>
consoles:
  enabled: true
  path: "/api/consoles"
  host: "5.78.70.68"
  desktop_port: 6080
  desktop_path: "/vnc.html"
  terminal_port: 7681
"#;

const JSON_MINIMAL: &str = r#"{
  "cockpit": {
    "upstream": "http://5.78.70.68:9090"
  }
}
"#;

const JSON_FULL: &str = r#"{
  "defaults": {},
  "cockpit": {
    "enabled": true,
    "prefix": "/api/cockpit",
    "upstream": "http://5.78.70.68:9090",
    "user_agent": "Mozilla/5.0",
    "accept": "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "accept_language": "en-US,en;q=0.5"
  },
  "proxy": {
    "enabled": true,
    "path": "/api/proxy",
    "user_agent": "Hetzner-Dashboard-Proxy",
    "content_type": "text/html",
    "accept": "*/*"
  },
  "consoles": {
    "enabled": true,
    "path": "/api/consoles",
    "host": "5.78.70.68",
    "desktop_port": 6080,
    "desktop_path": "/vnc.html",
    "terminal_port": 7681
  }
}
"#;

const TOML_MINIMAL: &str = r#"# servergate config

[cockpit]
upstream = "http://5.78.70.68:9090"
"#;

const TOML_FULL: &str = r#"# servergate config
#
# All values shown are defaults. Remove what you do not change.

[defaults]
# Upstream timeout in ms. Leave unset to wait indefinitely.
# timeout = 30000

[cockpit]
enabled = true
prefix = "/api/cockpit"
upstream = "http://5.78.70.68:9090"
user_agent = "Mozilla/5.0"
accept = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
accept_language = "en-US,en;q=0.5"

[proxy]
enabled = true
path = "/api/proxy"
user_agent = "Hetzner-Dashboard-Proxy"
content_type = "text/html"
accept = "*/*"

[consoles]
enabled = true
path = "/api/consoles"
host = "5.78.70.68"
desktop_port = 6080
desktop_path = "/vnc.html"
terminal_port = 7681
"#;
