//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table and view registry from configuration
//! - Attach the shipped navigation hooks
//! - Preload eager views and bind the listener
//!
//! # Design Decisions
//! - Fail fast: an invalid table or an unbindable address is fatal
//! - Listeners bind last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::schema::RouterConfig;
use crate::config::validation::ValidationError;
use crate::navigation::{DocumentTitleHook, Navigator, QuizProgress, ViewHistory, ViewHistoryHook};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid route table: {}", join_errors(.0))]
    InvalidTable(Vec<ValidationError>),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

/// Shared runtime pieces handed to the host.
pub struct Services {
    pub navigator: Arc<Navigator>,
    pub history: Arc<ViewHistory>,
    pub progress: Arc<QuizProgress>,
    pub title: Arc<DocumentTitleHook>,
}

/// Build the navigator with title and view history hooks.
pub fn build_services(config: &RouterConfig) -> Result<Services, StartupError> {
    let history = Arc::new(ViewHistory::new());
    let progress = Arc::new(QuizProgress::new());
    let title = Arc::new(DocumentTitleHook::new(config.navigation.default_title.clone()));
    let history_hook = ViewHistoryHook::new(
        config.navigation.tracked_views.clone(),
        history.clone(),
        progress.clone(),
    );

    let navigator = Navigator::from_config(config)
        .map_err(StartupError::InvalidTable)?
        .with_hook(title.clone())
        .with_hook(Arc::new(history_hook));

    tracing::info!(
        routes = navigator.table().len(),
        tracked_views = config.navigation.tracked_views.len(),
        "Route table compiled"
    );

    Ok(Services {
        navigator: Arc::new(navigator),
        history,
        progress,
        title,
    })
}

/// Preload eager views. Failures are logged, not fatal.
pub async fn warm_up(navigator: &Navigator) -> usize {
    navigator.preload_eager().await
}

pub async fn bind(config: &RouterConfig) -> Result<TcpListener, StartupError> {
    let address = config.listener.bind_address.clone();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    #[tokio::test]
    async fn test_services_record_tracked_views() {
        let services = build_services(&RouterConfig::default()).unwrap();
        services.progress.set("quiz", 7);

        services.navigator.navigate("/quiz").await.unwrap();
        assert_eq!(services.history.get("quiz").unwrap().current_index, 7);
        assert_eq!(services.title.current().as_str(), "Quiz - Study Quiz");
        assert_eq!(warm_up(&services.navigator).await, 1);
    }

    #[test]
    fn test_invalid_table_is_fatal() {
        let mut config = RouterConfig::default();
        config.routes = vec![RouteConfig {
            path: "/".into(),
            view: Some("views/Home.vue".into()),
            ..Default::default()
        }];
        let err = build_services(&config).err().unwrap();
        assert!(matches!(err, StartupError::InvalidTable(_)));
        assert!(err.to_string().contains("catch-all"));
    }

    #[tokio::test]
    async fn test_bind_error_names_address() {
        let mut config = RouterConfig::default();
        config.listener.bind_address = "not-an-address".into();
        let err = bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("not-an-address"));
    }
}
