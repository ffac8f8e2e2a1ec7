//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use study_router::config::RouterConfig;
use study_router::lifecycle::{build_services, Services, Shutdown};
use study_router::NavigationServer;

/// Build a host from `config` with the shipped hooks attached.
pub fn test_server(config: RouterConfig) -> (NavigationServer, Services) {
    let services = build_services(&config).unwrap();
    let server =
        NavigationServer::new(config, services.navigator.clone(), services.history.clone());
    (server, services)
}

/// Send a GET through the router without a socket and decode the JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// A running host on an ephemeral port.
#[allow(dead_code)]
pub struct RunningHost {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RouterConfig>,
    pub services: Services,
}

#[allow(dead_code)]
pub async fn start_host(config: RouterConfig) -> RunningHost {
    let (server, services) = test_server(config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningHost {
        addr,
        shutdown,
        updates,
        services,
    }
}

/// Write `files` under a fresh temporary directory.
#[allow(dead_code)]
pub fn temp_views(files: &[(&str, &str)]) -> PathBuf {
    let root = std::env::temp_dir().join(format!("study-router-views-{}", uuid::Uuid::new_v4()));
    for (module, contents) in files {
        let path = root.join(module);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
    root
}
