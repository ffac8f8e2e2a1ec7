//! HTTP navigation host.
//!
//! # Responsibilities
//! - Create the Axum Router with the management and navigation handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Apply hot-reloaded route tables while serving
//! - Stop on the shutdown broadcast
//!
//! # Design Decisions
//! - Requests are independent one-shot navigations; last-navigation-wins is a
//!   per-client concern handled by `NavigationSession`
//! - Everything outside `/_router` is a navigation target

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::watcher::apply_updates;
use crate::config::RouterConfig;
use crate::http::response::{route_rows, NavigationResponse};
use crate::navigation::{Navigator, ViewHistory};
use crate::observability::metrics;

/// Prefix reserved for management endpoints.
pub const MANAGEMENT_PREFIX: &str = "/_router";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub navigator: Arc<Navigator>,
    pub history: Arc<ViewHistory>,
}

/// HTTP server answering navigation requests.
pub struct NavigationServer {
    router: Router,
    navigator: Arc<Navigator>,
    config: RouterConfig,
}

impl NavigationServer {
    pub fn new(config: RouterConfig, navigator: Arc<Navigator>, history: Arc<ViewHistory>) -> Self {
        let state = AppState {
            navigator: navigator.clone(),
            history,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            navigator,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/_router/health", get(health_handler))
            .route("/_router/routes", get(routes_handler))
            .route("/_router/history", get(history_handler))
            .fallback(navigate_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The assembled router, for driving the host without a socket.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Serve on `listener` until a shutdown signal arrives.
    ///
    /// Configurations received on `config_updates` replace the route table.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.navigator.table().len(),
            "Navigation host starting"
        );

        let reloader = tokio::spawn(apply_updates(self.navigator.clone(), config_updates));

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("Navigation host stopped");
        Ok(())
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let table = state.navigator.table();
    Json(json!({
        "status": "ok",
        "routes": table.len(),
        "cached_views": state.navigator.views().cached_count(),
    }))
}

async fn routes_handler(State(state): State<AppState>) -> impl IntoResponse {
    let table = state.navigator.table();
    Json(route_rows(&table))
}

async fn history_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.history.snapshot())
}

/// Navigate to the request path and answer with the rendered navigation.
async fn navigate_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let start = Instant::now();
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = if method != Method::GET && method != Method::HEAD {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({ "error": format!("method {} not allowed", method) })),
        )
            .into_response()
    } else if uri.path() == MANAGEMENT_PREFIX || uri.path().starts_with("/_router/") {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown management endpoint '{}'", uri.path()) })),
        )
            .into_response()
    } else {
        let target = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());

        tracing::debug!(request_id = %request_id, target = %target, "Navigation request");

        match state.navigator.navigate(target).await {
            Ok(navigation) => NavigationResponse(navigation).into_response(),
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    target = %target,
                    error = %e,
                    "Navigation failed"
                );
                e.into_response()
            }
        }
    };

    metrics::record_http_request(response.status().as_u16(), start);
    response
}
