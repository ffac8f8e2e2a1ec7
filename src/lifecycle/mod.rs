//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Compile table → Attach hooks → Preload eager views → Bind
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown broadcast
//!     SIGHUP → Reload config file
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → Stop accepting → Drain in-flight requests → Exit
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{next_signal, Signal};
pub use startup::{build_services, Services, StartupError};
