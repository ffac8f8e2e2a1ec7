//! Study Router
//!
//! Route table resolver and navigation host for a study/quiz application.
//!
//! # Architecture Overview
//!
//! ```text
//!     navigation target ──▶ routing (normalize, match, redirect, fallback)
//!                                │
//!                                ▼
//!                           navigation (hooks, sessions)
//!                                │
//!                                ▼
//!                           views (deferred load, cache)
//!
//!     config (schema, validation, watcher) feeds routing and views;
//!     http serves navigations as JSON; lifecycle and observability
//!     run alongside.
//! ```

// Core subsystems
pub mod config;
pub mod navigation;
pub mod routing;
pub mod views;

// Host
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::RouterConfig;
pub use http::NavigationServer;
pub use lifecycle::Shutdown;
pub use navigation::Navigator;
pub use routing::{Resolution, RouteTable};
