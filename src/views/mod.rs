//! View loading subsystem.
//!
//! # Data Flow
//! ```text
//! Resolution (matched chain)
//!     → registry.rs (cache lookup per module)
//!     → loader.rs (ViewLoader: filesystem bundle or manifest-only)
//!     → LoadedView cached, handed to the rendering host
//!
//! Startup:
//!     RouteTable::eager_views() → registry.preload()
//! ```
//!
//! # Design Decisions
//! - Views load on first navigation to a route that needs them
//! - A module is loaded once, later navigations hit the cache
//! - Loaders return boxed futures so they can sit behind `Arc<dyn ViewLoader>`
//! - Failures propagate to the caller, nothing is retried here

pub mod loader;
pub mod registry;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

pub use loader::{FsViewLoader, ManifestViewLoader};
pub use registry::ViewRegistry;

/// Reference to a view module, resolved lazily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewRef {
    /// Module path, e.g. `views/QuizMode.vue`.
    pub module: String,
    /// Loaded at startup rather than on first navigation.
    pub eager: bool,
}

/// A view module that finished loading.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedView {
    pub module: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub contents: Arc<[u8]>,
}

impl LoadedView {
    pub fn new(module: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            module: module.into(),
            size_bytes: contents.len(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("view module '{0}' not found")]
    NotFound(String),

    #[error("failed to read view module '{module}': {message}")]
    Io { module: String, message: String },

    #[error("loading view module '{module}' timed out after {timeout:?}")]
    Timeout { module: String, timeout: Duration },

    #[error("view module '{module}' rejected: {reason}")]
    Rejected { module: String, reason: String },
}

/// Source of view modules.
pub trait ViewLoader: Send + Sync + std::fmt::Debug {
    /// Fetch the module behind `view`.
    fn load<'a>(&'a self, view: &'a ViewRef) -> BoxFuture<'a, Result<LoadedView, LoadError>>;
}
