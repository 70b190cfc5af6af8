//! Maps a request path onto one of the configured gateway routes.
//!
//! Exact routes (generic proxy, console links) are checked first, then
//! the Cockpit prefix, which matches the prefix itself and anything below
//! it on a segment boundary: `/api/cockpit/x` matches, `/api/cockpitx`
//! does not.

use crate::config::model::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Cockpit,
    Generic,
    Consoles,
}

#[must_use]
pub fn match_route(config: &Config, path: &str) -> Option<RouteKind> {
    if config.proxy.enabled && path == config.proxy.path {
        return Some(RouteKind::Generic);
    }
    if config.consoles.enabled && path == config.consoles.path {
        return Some(RouteKind::Consoles);
    }
    if config.cockpit.enabled && is_under_prefix(path, &config.cockpit.prefix) {
        return Some(RouteKind::Cockpit);
    }
    None
}

fn is_under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
