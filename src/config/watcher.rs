//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;
use crate::navigation::Navigator;
use crate::observability::metrics;
use crate::routing::{MatchOptions, RouteTable};

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Sender feeding the same update channel, for reloads not driven by file events.
    pub fn sender(&self) -> mpsc::UnboundedSender<RouterConfig> {
        self.update_tx.clone()
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned handle must be kept alive for as long as watching should continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                metrics::record_table_reload("rejected");
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload config. Keeping current route table."
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Apply reloaded configurations to `navigator` until the channel closes.
///
/// Only the route table and matching options are reloaded; listener and
/// observability settings need a restart.
pub async fn apply_updates(
    navigator: Arc<Navigator>,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
) {
    while let Some(config) = updates.recv().await {
        match RouteTable::build(&config.routes, MatchOptions::from(&config.navigation)) {
            Ok(table) => {
                navigator.replace_table(table);
                navigator.views().clear();
            }
            Err(errors) => {
                metrics::record_table_reload("rejected");
                tracing::error!(errors = errors.len(), "Reloaded route table rejected");
            }
        }
    }
    tracing::debug!("Config update channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::views::{ManifestViewLoader, ViewRegistry};

    #[tokio::test]
    async fn test_apply_updates_swaps_table() {
        let views = Arc::new(ViewRegistry::new(Arc::new(ManifestViewLoader), None));
        let table = RouteTable::builtin().unwrap();
        let navigator = Arc::new(Navigator::new(table, views, "Study Quiz"));
        navigator.navigate("/quiz").await.unwrap();
        assert_eq!(navigator.views().cached_count(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = RouterConfig::default();
        config.routes.insert(
            0,
            RouteConfig {
                path: "/exam".into(),
                name: Some("Exam".into()),
                view: Some("views/Exam.vue".into()),
                ..Default::default()
            },
        );
        tx.send(config).unwrap();
        drop(tx);

        apply_updates(navigator.clone(), rx).await;
        assert_eq!(navigator.resolve("/exam").name(), Some("Exam"));
        assert_eq!(navigator.views().cached_count(), 0);
    }
}
