//! Navigation hooks.
//!
//! `before_each` runs after resolution and before any view loads; it may abort
//! the navigation. `after_each` runs once the navigation is committed and is
//! skipped for superseded navigations.

use std::collections::BTreeMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::navigation::history::{ProgressSource, ViewHistory};
use crate::routing::Resolution;

/// Decision returned by a `before_each` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Continue,
    Abort(String),
}

pub trait NavigationHook: Send + Sync {
    fn before_each(&self, _to: &Resolution, _from: Option<&Resolution>) -> Guard {
        Guard::Continue
    }

    fn after_each(&self, _to: &Resolution, _from: Option<&Resolution>) {}
}

/// Keeps the document title in step with navigation.
#[derive(Debug)]
pub struct DocumentTitleHook {
    default_title: String,
    current: ArcSwap<String>,
}

impl DocumentTitleHook {
    pub fn new(default_title: impl Into<String>) -> Self {
        let default_title = default_title.into();
        Self {
            current: ArcSwap::from_pointee(default_title.clone()),
            default_title,
        }
    }

    pub fn current(&self) -> Arc<String> {
        self.current.load_full()
    }
}

impl NavigationHook for DocumentTitleHook {
    fn before_each(&self, to: &Resolution, _from: Option<&Resolution>) -> Guard {
        let title = to.title().unwrap_or(&self.default_title).to_string();
        self.current.store(Arc::new(title));
        Guard::Continue
    }
}

/// Records visits to tracked routes into a [`ViewHistory`].
#[derive(Debug)]
pub struct ViewHistoryHook {
    /// Route name -> history key.
    tracked: BTreeMap<String, String>,
    history: Arc<ViewHistory>,
    progress: Arc<dyn ProgressSource>,
}

impl ViewHistoryHook {
    pub fn new(
        tracked: BTreeMap<String, String>,
        history: Arc<ViewHistory>,
        progress: Arc<dyn ProgressSource>,
    ) -> Self {
        Self {
            tracked,
            history,
            progress,
        }
    }
}

impl NavigationHook for ViewHistoryHook {
    fn after_each(&self, to: &Resolution, _from: Option<&Resolution>) {
        let Some(view) = to.name().and_then(|name| self.tracked.get(name)) else {
            return;
        };
        let index = self.progress.current_index(view);
        self.history.record(view, to.path(), index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::history::QuizProgress;
    use crate::routing::RouteTable;

    #[test]
    fn test_document_title() {
        let table = RouteTable::builtin().unwrap();
        let hook = DocumentTitleHook::new("Study Quiz");
        assert_eq!(hook.current().as_str(), "Study Quiz");

        hook.before_each(&table.resolve("/stats"), None);
        assert_eq!(hook.current().as_str(), "Overview - Study Quiz");

        hook.before_each(&table.resolve("/nope"), None);
        assert_eq!(hook.current().as_str(), "404 Not Found - Study Quiz");
    }

    #[test]
    fn test_view_history_tracks_configured_routes() {
        let table = RouteTable::builtin().unwrap();
        let history = Arc::new(ViewHistory::new());
        let progress = Arc::new(QuizProgress::new());
        progress.set("quiz", 4);

        let mut tracked = BTreeMap::new();
        tracked.insert("QuizMode".to_string(), "quiz".to_string());
        let hook = ViewHistoryHook::new(tracked, history.clone(), progress);

        hook.after_each(&table.resolve("/drill"), None);
        assert!(history.is_empty());

        hook.after_each(&table.resolve("/quiz"), None);
        let entry = history.get("quiz").unwrap();
        assert_eq!(entry.current_index, 4);
        assert_eq!(entry.path, "/quiz");
    }
}
