//! `servergate run` — start the gateway.
//!
//! Picks a config source (explicit file, auto-detected file, or the
//! built-in defaults), applies CLI/env overrides, starts the Axum server
//! with graceful shutdown, and spawns a background refresh loop that
//! hot-reloads the config file when its contents change.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::sources;
use crate::config::validation::validate;
use crate::config::{BuiltinSource, ConfigSource, ConfigVersion};
use crate::error::GatewayError;
use crate::logging;
use crate::server::{self, AppState, LoadedConfig};

/// Settings from flags or environment that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub timeout: Option<u64>,
    pub cockpit_upstream: Option<String>,
}

impl Overrides {
    #[must_use]
    pub fn from_args(args: &RunArgs) -> Self {
        Self {
            timeout: args.timeout,
            cockpit_upstream: args.cockpit_upstream.clone(),
        }
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.defaults.timeout = Some(timeout);
        }
        if let Some(ref upstream) = self.cockpit_upstream {
            config.cockpit.upstream.clone_from(upstream);
        }
    }
}

pub async fn execute(args: RunArgs) -> Result<(), GatewayError> {
    logging::init(&args.log_level, logging::resolve_format(args.pretty, args.json));

    let source = resolve_source(args.config.as_deref()).await?;
    let overrides = Overrides::from_args(&args);
    let (config, version) = load_config(source.as_ref(), &overrides).await?;

    let cockpit_upstream = config.cockpit.upstream_base().to_string();
    let routes = config.route_paths();

    let state = Arc::new(AppState::new(LoadedConfig::new(
        config,
        version,
        source.name(),
    )));

    // Shutdown signal: sending on shutdown_tx stops the refresh loop
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let refresh_state = state.clone();
    let poll_interval = args.poll_interval;
    let refresh_handle = tokio::spawn(async move {
        config_refresh_loop(refresh_state, source, overrides, poll_interval, shutdown_rx).await;
    });

    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        cockpit = %cockpit_upstream,
        routes = ?routes,
        "servergate started"
    );

    let graceful_shutdown = async move {
        server::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    if let Err(e) = refresh_handle.await {
        tracing::error!(error = %e, "config refresh task failed");
    }

    tracing::info!("servergate stopped");
    Ok(())
}

/// Explicit path, then `./servergate.*`, then compiled-in defaults.
pub async fn resolve_source(explicit: Option<&Path>) -> Result<Box<dyn ConfigSource>, GatewayError> {
    if let Some(path) = explicit {
        return sources::for_path(path);
    }

    if let Some(path) = sources::discover(Path::new(".")).await {
        tracing::info!(path = %path.display(), "auto-detected config file");
        return sources::for_path(&path);
    }

    tracing::info!("no config file found, using built-in defaults");
    Ok(Box::new(BuiltinSource))
}

/// Load from `source`, apply overrides, and re-validate the result.
pub async fn load_config(
    source: &dyn ConfigSource,
    overrides: &Overrides,
) -> Result<(Config, ConfigVersion), GatewayError> {
    let (mut config, version) = source.load().await?;
    overrides.apply(&mut config);
    validate(&config).map_err(|errors| GatewayError::ConfigValidation { errors })?;
    Ok((config, version))
}

async fn config_refresh_loop(
    state: Arc<AppState>,
    source: Box<dyn ConfigSource>,
    overrides: Overrides,
    interval_secs: u64,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.tick().await; // Skip first immediate tick

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!("config refresh loop shutting down");
                return;
            }
        }

        let current_version = state.config.read().await.version.clone();

        match source.has_changed(&current_version).await {
            Ok(true) => {
                tracing::info!(source = source.name(), "config change detected, reloading");
                match load_config(source.as_ref(), &overrides).await {
                    Ok((config, version)) => {
                        let short = version.short();
                        let mut loaded = state.config.write().await;
                        *loaded = LoadedConfig::new(config, version, source.name());
                        drop(loaded);
                        state
                            .stats
                            .config_reloads
                            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        tracing::info!(version = %short, "config reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "config reload failed, keeping current config");
                    }
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(error = %e, "config change check failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        Overrides {
            timeout: Some(1500),
            cockpit_upstream: Some("https://10.0.0.5:9090".into()),
        }
        .apply(&mut config);
        assert_eq!(config.defaults.timeout, Some(1500));
        assert_eq!(config.cockpit.upstream, "https://10.0.0.5:9090");
    }

    #[test]
    fn empty_overrides_change_nothing() {
        let mut config = Config::default();
        config.defaults.timeout = Some(800);
        Overrides::default().apply(&mut config);
        assert_eq!(config.defaults.timeout, Some(800));
        assert_eq!(config.cockpit.upstream, "http://5.78.70.68:9090");
    }

    #[tokio::test]
    async fn invalid_override_is_rejected() {
        let overrides = Overrides {
            timeout: None,
            cockpit_upstream: Some("not a url".into()),
        };
        let err = load_config(&BuiltinSource, &overrides).await.unwrap_err();
        assert!(matches!(err, GatewayError::ConfigValidation { .. }));
    }

    #[tokio::test]
    async fn explicit_path_with_unknown_extension_fails() {
        let result = resolve_source(Some(Path::new("gateway.ini"))).await;
        assert!(matches!(result, Err(GatewayError::UnsupportedFormat(_))));
    }
}
