//! Integration tests for the HTTP server, health endpoint, and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use servergate::config::model::Config;
use servergate::config::ConfigVersion;
use servergate::health::HealthResponse;
use servergate::server::{self, AppState, LoadedConfig};

async fn start_test_server(config: Config) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let state = Arc::new(AppState::new(LoadedConfig::new(
        config,
        ConfigVersion::Hash("0123456789abcdef".into()),
        "test",
    )));

    let router = server::build_router(state, 1_048_576);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

#[tokio::test]
async fn health_endpoint_returns_healthy() {
    let (addr, shutdown) = start_test_server(Config::default()).await;

    let url = format!("http://{addr}/health");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let health: HealthResponse = resp.json().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.config.source, "test");
    assert_eq!(health.config.version, "01234567");
    assert_eq!(health.config.cockpit_upstream, "http://5.78.70.68:9090");
    assert_eq!(
        health.config.routes,
        vec!["/api/cockpit/*", "/api/proxy", "/api/consoles"]
    );
    assert_eq!(health.stats.requests_forwarded, 0);
    assert_eq!(health.stats.requests_failed, 0);
    assert_eq!(health.stats.config_reloads, 0);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_lists_only_enabled_routes() {
    let mut config = Config::default();
    config.proxy.enabled = false;
    config.consoles.enabled = false;
    let (addr, shutdown) = start_test_server(config).await;

    let url = format!("http://{addr}/health");
    let health: HealthResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(health.config.routes, vec!["/api/cockpit/*"]);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn unmatched_route_returns_404() {
    let (addr, shutdown) = start_test_server(Config::default()).await;

    for path in ["/nonexistent", "/api/cockpitx", "/api"] {
        let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(resp.status(), 404, "{path}");
    }

    let _ = shutdown.send(());
}

#[tokio::test]
async fn disabled_route_returns_404() {
    let mut config = Config::default();
    config.proxy.enabled = false;
    let (addr, shutdown) = start_test_server(config).await;

    let url = format!("http://{addr}/api/proxy?target=http://127.0.0.1:1/");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 404);

    let _ = shutdown.send(());
}

#[tokio::test]
async fn health_version_matches_crate() {
    let (addr, shutdown) = start_test_server(Config::default()).await;

    let url = format!("http://{addr}/health");
    let health: HealthResponse = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));

    let _ = shutdown.send(());
}

#[tokio::test]
async fn consoles_endpoint_builds_links() {
    let (addr, shutdown) = start_test_server(Config::default()).await;

    let url = format!("http://{addr}/api/consoles?host=10.1.2.3");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);
    let links: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(links["host"], "10.1.2.3");
    assert_eq!(links["desktop_url"], "http://10.1.2.3:6080/vnc.html");
    assert_eq!(links["terminal_url"], "http://10.1.2.3:7681");
    assert_eq!(links["cockpit_url"], "/api/cockpit/");

    let resp = reqwest::get(format!("http://{addr}/api/consoles"))
        .await
        .unwrap();
    let links: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(links["host"], "5.78.70.68");

    let _ = shutdown.send(());
}

#[tokio::test]
async fn graceful_shutdown_works() {
    let (addr, shutdown) = start_test_server(Config::default()).await;

    let url = format!("http://{addr}/health");
    assert!(reqwest::get(&url).await.is_ok());

    let _ = shutdown.send(());

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    let result = reqwest::get(&url).await;
    assert!(result.is_err());
}
