//! Navigation pipeline.
//!
//! # Responsibilities
//! - Own the current route table (swappable on reload)
//! - Resolve, run hooks, load the matched views
//! - Build named links
//!
//! # Design Decisions
//! - Split into `prepare` (resolve, guards, loads) and `commit` (after hooks)
//!   so a session can drop a stale navigation between the two
//! - The table is read once per navigation; a reload mid-flight does not
//!   affect navigations already resolved

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::ValidationError;
use crate::navigation::hooks::{Guard, NavigationHook};
use crate::navigation::session::NavigationSession;
use crate::observability::metrics;
use crate::routing::{MatchOptions, Resolution, RouteTable};
use crate::views::{LoadError, LoadedView, ViewRegistry};

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    ViewLoad(#[from] LoadError),

    #[error("navigation to '{path}' aborted: {reason}")]
    Aborted { path: String, reason: String },
}

/// A resolved navigation with its views loaded.
#[derive(Debug, Clone)]
pub struct Navigation {
    pub resolution: Resolution,
    /// Loaded views of the matched chain, outermost first.
    pub views: Vec<Arc<LoadedView>>,
    pub title: String,
}

/// A navigation whose views are loaded but whose after hooks have not run.
#[derive(Debug)]
pub struct PendingNavigation(Navigation);

impl PendingNavigation {
    pub fn resolution(&self) -> &Resolution {
        &self.0.resolution
    }
}

pub struct Navigator {
    table: ArcSwap<RouteTable>,
    views: Arc<ViewRegistry>,
    hooks: Vec<Arc<dyn NavigationHook>>,
    default_title: String,
}

impl Navigator {
    pub fn new(
        table: RouteTable,
        views: Arc<ViewRegistry>,
        default_title: impl Into<String>,
    ) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            views,
            hooks: Vec::new(),
            default_title: default_title.into(),
        }
    }

    /// Build the table and view registry described by `config`. No hooks are attached.
    pub fn from_config(config: &RouterConfig) -> Result<Self, Vec<ValidationError>> {
        let table = RouteTable::build(&config.routes, MatchOptions::from(&config.navigation))?;
        let views = Arc::new(ViewRegistry::from_config(&config.navigation));
        Ok(Self::new(table, views, config.navigation.default_title.clone()))
    }

    pub fn with_hook(mut self, hook: Arc<dyn NavigationHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn table(&self) -> Arc<RouteTable> {
        self.table.load_full()
    }

    /// Swap in a new table. Navigations already resolved keep the old one.
    pub fn replace_table(&self, table: RouteTable) {
        tracing::info!(routes = table.len(), "Route table replaced");
        self.table.store(Arc::new(table));
        metrics::record_table_reload("ok");
    }

    pub fn views(&self) -> &Arc<ViewRegistry> {
        &self.views
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    /// Resolve without loading anything or running hooks.
    pub fn resolve(&self, target: &str) -> Resolution {
        self.table.load().resolve(target)
    }

    pub fn href_for(&self, name: &str, params: &BTreeMap<String, String>) -> Option<String> {
        self.table.load().href_for(name, params)
    }

    /// Load the table's eager views.
    pub async fn preload_eager(&self) -> usize {
        let table = self.table();
        self.views.preload(table.eager_views()).await
    }

    /// Resolve `target`, run `before_each` hooks and load the matched views.
    pub async fn prepare(
        &self,
        target: &str,
        from: Option<&Resolution>,
    ) -> Result<PendingNavigation, NavigationError> {
        let resolution = self.resolve(target);

        for hook in &self.hooks {
            if let Guard::Abort(reason) = hook.before_each(&resolution, from) {
                metrics::record_aborted();
                tracing::info!(path = %resolution.path(), reason = %reason, "Navigation aborted");
                return Err(NavigationError::Aborted {
                    path: resolution.path().to_string(),
                    reason,
                });
            }
        }

        let views = self.views.load_all(resolution.views()).await?;
        let title = resolution.title().unwrap_or(&self.default_title).to_string();

        Ok(PendingNavigation(Navigation {
            resolution,
            views,
            title,
        }))
    }

    /// Run `after_each` hooks and hand out the finished navigation.
    pub fn commit(&self, pending: PendingNavigation, from: Option<&Resolution>) -> Navigation {
        let navigation = pending.0;
        for hook in &self.hooks {
            hook.after_each(&navigation.resolution, from);
        }
        tracing::info!(
            path = %navigation.resolution.path(),
            route = navigation.resolution.name().unwrap_or("unnamed"),
            views = navigation.views.len(),
            "Navigation complete"
        );
        navigation
    }

    /// One-shot navigation with no previous location.
    pub async fn navigate(&self, target: &str) -> Result<Navigation, NavigationError> {
        let pending = self.prepare(target, None).await?;
        Ok(self.commit(pending, None))
    }

    /// Start a client session with last-navigation-wins semantics.
    pub fn session(self: &Arc<Self>) -> NavigationSession {
        NavigationSession::new(self.clone())
    }
}
