//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation target (path, query, fragment or absolute URL)
//!     → path.rs (split, normalize, strip base path)
//!     → resolver.rs (walk levels, recurse into children, follow redirect)
//!     → pattern.rs (literal / :param / catch-all segment matching)
//!     → Return: Resolution (matched chain, params), fallback at worst
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → validation (paths, names, fallback, redirect targets)
//!     → table.rs (flatten, sort each level by precedence, name index)
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - Literal before parameter before catch-all, then declaration order

pub mod path;
pub mod pattern;
pub mod resolver;
pub mod table;

pub use path::Location;
pub use resolver::{Resolution, ResolutionOutcome};
pub use table::{MatchOptions, RouteRecord, RouteTable};
