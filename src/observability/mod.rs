//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms via `metrics`)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event (route, module, outcome)
//! - The HTTP request ID is logged with every navigation request
//! - Metrics are cheap (atomic increments); without an installed recorder
//!   they are no-ops, so library users and tests pay nothing

pub mod logging;
pub mod metrics;
