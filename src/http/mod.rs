//! HTTP navigation host.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → /_router/* management handlers
//!     → otherwise: Navigator::navigate(path + query)
//!     → response.rs (JSON body, status mapping)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::{NavigationBody, RouteRow};
pub use server::{AppState, NavigationServer};
