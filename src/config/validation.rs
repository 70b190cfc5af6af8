//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for mistakes such
//! as malformed route paths, overlapping routes, bad upstream URLs and
//! header values that could never be sent. Returns every
//! [`ValidationError`] found, each with a suggestion where one is obvious.

use axum::http::HeaderValue;
use url::Url;

use super::model::Config;
use crate::error::ValidationError;

/// Validate a route path or prefix. Returns `Ok(())` or a human-readable error.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!(
            "path must start with '/' (did you mean '/{path}'?)"
        ));
    }
    if path.len() > 1 && path.ends_with('/') {
        return Err("path must not end with '/'".into());
    }
    if path.contains('?') || path.contains('#') {
        return Err("path must not contain a query or fragment".into());
    }
    Ok(())
}

/// Validate an upstream base URL. Returns `Ok(())` or a human-readable error.
pub fn validate_upstream_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                return Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ));
            }
            if parsed.query().is_some() || parsed.fragment().is_some() {
                return Err("upstream must not carry a query or fragment".into());
            }
            Ok(())
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

fn validate_header_value(value: &str) -> Result<(), String> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| format!("'{value}' is not a valid header value"))
}

fn push(
    errors: &mut Vec<ValidationError>,
    section: &str,
    field: &str,
    message: String,
    suggestion: Option<String>,
) {
    errors.push(ValidationError {
        section: section.into(),
        field: field.into(),
        message,
        suggestion,
    });
}

fn check_path(errors: &mut Vec<ValidationError>, section: &str, field: &str, path: &str) {
    if let Err(msg) = validate_path(path) {
        let suggestion = if path.is_empty() {
            None
        } else if !path.starts_with('/') {
            Some(format!("did you mean '/{path}'?"))
        } else if path.len() > 1 && path.ends_with('/') {
            Some(format!("did you mean '{}'?", path.trim_end_matches('/')))
        } else {
            None
        };
        push(errors, section, field, msg, suggestion);
    }
}

fn check_header(errors: &mut Vec<ValidationError>, section: &str, field: &str, value: &str) {
    if let Err(msg) = validate_header_value(value) {
        push(errors, section, field, msg, None);
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.defaults.timeout == Some(0) {
        push(
            &mut errors,
            "defaults",
            "timeout",
            "timeout must be greater than zero".into(),
            Some("omit the field to wait indefinitely".into()),
        );
    }

    let cockpit = &config.cockpit;
    check_path(&mut errors, "cockpit", "prefix", &cockpit.prefix);
    if cockpit.prefix == "/" {
        push(
            &mut errors,
            "cockpit",
            "prefix",
            "prefix cannot be the root path".into(),
            Some("use a dedicated prefix such as '/api/cockpit'".into()),
        );
    }
    if let Err(msg) = validate_upstream_url(&cockpit.upstream) {
        push(&mut errors, "cockpit", "upstream", msg, None);
    }
    check_header(&mut errors, "cockpit", "user_agent", &cockpit.user_agent);
    check_header(&mut errors, "cockpit", "accept", &cockpit.accept);
    check_header(&mut errors, "cockpit", "accept_language", &cockpit.accept_language);

    let proxy = &config.proxy;
    check_path(&mut errors, "proxy", "path", &proxy.path);
    check_header(&mut errors, "proxy", "user_agent", &proxy.user_agent);
    check_header(&mut errors, "proxy", "content_type", &proxy.content_type);
    check_header(&mut errors, "proxy", "accept", &proxy.accept);

    let consoles = &config.consoles;
    check_path(&mut errors, "consoles", "path", &consoles.path);
    if !consoles.desktop_path.starts_with('/') {
        push(
            &mut errors,
            "consoles",
            "desktop_path",
            "desktop path must start with '/'".into(),
            Some(format!("did you mean '/{}'?", consoles.desktop_path)),
        );
    }
    for (field, port) in [
        ("desktop_port", consoles.desktop_port),
        ("terminal_port", consoles.terminal_port),
    ] {
        if port == 0 {
            push(&mut errors, "consoles", field, "port cannot be 0".into(), None);
        }
    }
    if consoles.host.as_deref().is_some_and(str::is_empty) {
        push(
            &mut errors,
            "consoles",
            "host",
            "host cannot be empty".into(),
            Some("remove the field to require a host parameter".into()),
        );
    }

    check_overlaps(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn check_overlaps(config: &Config, errors: &mut Vec<ValidationError>) {
    let prefix = &config.cockpit.prefix;
    let exact = [
        ("proxy", config.proxy.enabled, &config.proxy.path),
        ("consoles", config.consoles.enabled, &config.consoles.path),
    ];

    for (section, enabled, path) in exact {
        if enabled && path == "/health" {
            push(
                errors,
                section,
                "path",
                "'/health' is reserved for the health endpoint".into(),
                None,
            );
        }
        if enabled && config.cockpit.enabled && under_prefix(path, prefix) {
            push(
                errors,
                section,
                "path",
                format!("path is shadowed by the cockpit prefix '{prefix}'"),
                None,
            );
        }
    }

    if config.cockpit.enabled && under_prefix("/health", prefix) {
        push(
            errors,
            "cockpit",
            "prefix",
            "prefix shadows the '/health' endpoint".into(),
            None,
        );
    }

    if config.proxy.enabled && config.consoles.enabled && config.proxy.path == config.consoles.path
    {
        push(
            errors,
            "consoles",
            "path",
            "duplicate route path".into(),
            Some("proxy and consoles must use different paths".into()),
        );
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let mut lines = vec![format!("  {} routes\n", config.route_paths().len())];

    if config.cockpit.enabled {
        lines.push(format!(
            "  {}/*  -> {}",
            config.cockpit.prefix,
            config.cockpit.upstream_base()
        ));
    }
    if config.proxy.enabled {
        lines.push(format!(
            "  {}  -> ?target=<url> | ?serverUrl=<url>&endpoint=<path>",
            config.proxy.path
        ));
    }
    if config.consoles.enabled {
        let host = config.consoles.host.as_deref().unwrap_or("<host parameter>");
        lines.push(format!("  {}  -> console links for {host}", config.consoles.path));
    }

    let timeout = config
        .defaults
        .timeout
        .map_or_else(|| "none".to_string(), |t| format!("{t}ms"));
    lines.push(format!("    timeout: {timeout}"));

    format!("{} is valid\n{}", path, lines.join("\n"))
}
