//! View cache in front of a loader.
//!
//! # Design Decisions
//! - One load per module at a time: concurrent callers share the in-flight future
//! - `clear` bumps a generation; loads started before it never reach the cache

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{try_join_all, BoxFuture, Shared};
use futures_util::FutureExt;

use crate::config::schema::NavigationConfig;
use crate::observability::metrics;
use crate::views::{FsViewLoader, LoadError, LoadedView, ManifestViewLoader, ViewLoader, ViewRef};

type LoadResult = Result<Arc<LoadedView>, LoadError>;
type InFlight = Shared<BoxFuture<'static, LoadResult>>;

/// Loads views on demand and keeps them once loaded.
pub struct ViewRegistry {
    loader: Arc<dyn ViewLoader>,
    cache: DashMap<String, Arc<LoadedView>>,
    /// Loads in progress, tagged with the generation they started in.
    in_flight: DashMap<String, (u64, InFlight)>,
    generation: AtomicU64,
    timeout: Option<Duration>,
}

impl fmt::Debug for ViewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("loader", &self.loader)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ViewRegistry {
    pub fn new(loader: Arc<dyn ViewLoader>, timeout: Option<Duration>) -> Self {
        Self {
            loader,
            cache: DashMap::new(),
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
            timeout,
        }
    }

    /// Registry backed by `views_dir` when set, manifest-only otherwise.
    pub fn from_config(nav: &NavigationConfig) -> Self {
        let loader: Arc<dyn ViewLoader> = match &nav.views_dir {
            Some(dir) => Arc::new(FsViewLoader::new(dir)),
            None => Arc::new(ManifestViewLoader),
        };
        Self::new(loader, nav.load_timeout_ms.map(Duration::from_millis))
    }

    /// Load one view, from cache when possible.
    pub async fn load(&self, view: &ViewRef) -> LoadResult {
        if let Some(hit) = self.cache.get(&view.module) {
            return Ok(hit.value().clone());
        }

        let (generation, flight) = match self.in_flight.entry(view.module.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                if let Some(hit) = self.cache.get(&view.module) {
                    return Ok(hit.value().clone());
                }
                let generation = self.generation.load(Ordering::SeqCst);
                let flight = self.start_load(view).shared();
                entry.insert((generation, flight.clone()));
                (generation, flight)
            }
        };

        let result = flight.clone().await;

        self.in_flight
            .remove_if(&view.module, |_, (_, f)| f.ptr_eq(&flight));

        if let Ok(loaded) = &result {
            if self.generation.load(Ordering::SeqCst) == generation {
                self.cache
                    .entry(view.module.clone())
                    .or_insert_with(|| loaded.clone());
                metrics::record_view_cache_size(self.cache.len());
            } else {
                tracing::debug!(
                    module = %view.module,
                    "View load outlived a cache clear, not cached"
                );
            }
        }
        result
    }

    fn start_load(&self, view: &ViewRef) -> BoxFuture<'static, LoadResult> {
        let loader = self.loader.clone();
        let timeout = self.timeout;
        let view = view.clone();

        async move {
            let start = Instant::now();
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, loader.load(&view))
                    .await
                    .unwrap_or_else(|_| {
                        Err(LoadError::Timeout {
                            module: view.module.clone(),
                            timeout: limit,
                        })
                    }),
                None => loader.load(&view).await,
            };

            match result {
                Ok(loaded) => {
                    metrics::record_view_load(&view.module, "ok", start);
                    tracing::debug!(
                        module = %view.module,
                        size_bytes = loaded.size_bytes,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "View loaded"
                    );
                    Ok(Arc::new(loaded))
                }
                Err(e) => {
                    metrics::record_view_load(&view.module, "error", start);
                    tracing::warn!(module = %view.module, error = %e, "View load failed");
                    Err(e)
                }
            }
        }
        .boxed()
    }

    /// Load several views concurrently; the first failure wins.
    pub async fn load_all<'a, I>(&self, views: I) -> Result<Vec<Arc<LoadedView>>, LoadError>
    where
        I: IntoIterator<Item = &'a ViewRef>,
    {
        try_join_all(views.into_iter().map(|v| self.load(v))).await
    }

    /// Load views ahead of navigation. Failures are logged, not returned.
    pub async fn preload<'a, I>(&self, views: I) -> usize
    where
        I: IntoIterator<Item = &'a ViewRef>,
    {
        let mut loaded = 0;
        for view in views {
            match self.load(view).await {
                Ok(_) => loaded += 1,
                Err(e) => {
                    tracing::error!(module = %view.module, error = %e, "Failed to preload view")
                }
            }
        }
        tracing::info!(loaded, "Eager views preloaded");
        loaded
    }

    pub fn is_cached(&self, module: &str) -> bool {
        self.cache.contains_key(module)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached view, e.g. after the bundle directory changed.
    ///
    /// Loads already running finish for their callers but are not cached.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.in_flight.clear();
        self.cache.clear();
        metrics::record_view_cache_size(0);
    }
}
