//! Per-client navigation session.
//!
//! # Responsibilities
//! - Hand out a generation ticket per navigation
//! - Discard navigations overtaken by a later one (last-navigation-wins)
//! - Track the current location, passed to hooks as `from`
//!
//! # Design Decisions
//! - Stale loads are not interrupted, their result is ignored
//! - A stale navigation reports `Superseded` even if its load failed
//! - After hooks never run for a stale navigation

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::Instrument;
use uuid::Uuid;

use crate::navigation::navigator::{Navigation, NavigationError, Navigator};
use crate::observability::metrics;
use crate::routing::Resolution;

/// Result of a session navigation.
#[derive(Debug)]
pub enum NavigationOutcome {
    Completed(Navigation),
    /// A later navigation started before this one finished loading.
    Superseded { target: String },
}

impl NavigationOutcome {
    pub fn is_superseded(&self) -> bool {
        matches!(self, NavigationOutcome::Superseded { .. })
    }
}

pub struct NavigationSession {
    id: Uuid,
    navigator: Arc<Navigator>,
    generation: AtomicU64,
    current: Mutex<Option<Resolution>>,
}

impl NavigationSession {
    pub fn new(navigator: Arc<Navigator>) -> Self {
        Self {
            id: Uuid::new_v4(),
            navigator,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Location of the last completed navigation.
    pub fn current(&self) -> Option<Resolution> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    pub async fn navigate(&self, target: &str) -> Result<NavigationOutcome, NavigationError> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let span = tracing::info_span!("navigation", session = %self.id, ticket, target = %target);

        async move {
            let from = self.current();
            let prepared = self.navigator.prepare(target, from.as_ref()).await;

            if self.generation.load(Ordering::SeqCst) != ticket {
                metrics::record_superseded();
                tracing::debug!("Navigation superseded, result dropped");
                return Ok(NavigationOutcome::Superseded {
                    target: target.to_string(),
                });
            }

            let navigation = self.navigator.commit(prepared?, from.as_ref());
            if let Ok(mut current) = self.current.lock() {
                *current = Some(navigation.resolution.clone());
            }
            Ok(NavigationOutcome::Completed(navigation))
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::hooks::NavigationHook;
    use crate::routing::RouteTable;
    use crate::views::{LoadError, LoadedView, ViewLoader, ViewRef, ViewRegistry};
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use tokio::sync::Notify;

    /// Holds quiz and drill views until released. Drill then fails, flashcards fail at once.
    #[derive(Debug, Default)]
    struct GateLoader {
        started: Notify,
        release: Notify,
    }

    impl ViewLoader for GateLoader {
        fn load<'a>(&'a self, view: &'a ViewRef) -> BoxFuture<'a, Result<LoadedView, LoadError>> {
            async move {
                match view.module.as_str() {
                    "views/QuizMode.vue" => {
                        self.started.notify_one();
                        self.release.notified().await;
                    }
                    "views/DrillMode.vue" => {
                        self.started.notify_one();
                        self.release.notified().await;
                        return Err(LoadError::NotFound(view.module.clone()));
                    }
                    "views/FlashcardMode.vue" => {
                        return Err(LoadError::NotFound(view.module.clone()));
                    }
                    _ => {}
                }
                Ok(LoadedView::new(view.module.clone(), Vec::new()))
            }
            .boxed()
        }
    }

    #[derive(Default)]
    struct AfterCounter {
        paths: Mutex<Vec<(String, Option<String>)>>,
    }

    impl NavigationHook for AfterCounter {
        fn after_each(&self, to: &Resolution, from: Option<&Resolution>) {
            self.paths
                .lock()
                .unwrap()
                .push((to.path().to_string(), from.map(|f| f.path().to_string())));
        }
    }

    fn setup() -> (Arc<GateLoader>, Arc<AfterCounter>, NavigationSession) {
        let loader = Arc::new(GateLoader::default());
        let hook = Arc::new(AfterCounter::default());
        let views = Arc::new(ViewRegistry::new(loader.clone(), None));
        let navigator = Arc::new(
            Navigator::new(RouteTable::builtin().unwrap(), views, "Study Quiz")
                .with_hook(hook.clone()),
        );
        (loader, hook, navigator.session())
    }

    #[tokio::test]
    async fn test_last_navigation_wins() {
        let (loader, hook, session) = setup();

        let slow = session.navigate("/quiz");
        let fast = async {
            loader.started.notified().await;
            let out = session.navigate("/review").await;
            loader.release.notify_one();
            out
        };

        let (slow_out, fast_out) = tokio::join!(slow, fast);
        assert!(slow_out.unwrap().is_superseded());
        match fast_out.unwrap() {
            NavigationOutcome::Completed(nav) => {
                assert_eq!(nav.resolution.name(), Some("ReviewMode"))
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(session.current().unwrap().name(), Some("ReviewMode"));
        assert_eq!(*hook.paths.lock().unwrap(), vec![("/review".to_string(), None)]);
    }

    #[tokio::test]
    async fn test_from_is_previous_location() {
        let (_loader, hook, session) = setup();
        session.navigate("/notes").await.unwrap();
        session.navigate("/questions/3").await.unwrap();

        let paths = hook.paths.lock().unwrap().clone();
        assert_eq!(paths[1], ("/questions/3".to_string(), Some("/notes".to_string())));
    }

    #[tokio::test]
    async fn test_load_failure_propagates_and_keeps_current() {
        let (_loader, _hook, session) = setup();
        session.navigate("/notes").await.unwrap();

        let err = session.navigate("/flashcards").await.unwrap_err();
        assert!(matches!(err, NavigationError::ViewLoad(LoadError::NotFound(_))));
        assert_eq!(session.current().unwrap().name(), Some("NoteList"));
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let (loader, hook, session) = setup();

        let stale = session.navigate("/drill");
        let fresh = async {
            loader.started.notified().await;
            let out = session.navigate("/notes").await;
            loader.release.notify_one();
            out
        };

        let (stale_out, fresh_out) = tokio::join!(stale, fresh);
        assert!(stale_out.unwrap().is_superseded());
        assert!(!fresh_out.unwrap().is_superseded());
        assert_eq!(session.current().unwrap().name(), Some("NoteList"));
        assert_eq!(hook.paths.lock().unwrap().len(), 1);
    }
}
