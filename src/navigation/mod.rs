//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! navigate(target)
//!     → navigator.rs: table.resolve(target)      (sync, never fails)
//!     → hooks.rs: before_each                    (may abort)
//!     → views: load matched chain                (async, concurrent)
//!     → session.rs: drop if superseded           (last-navigation-wins)
//!     → hooks.rs: after_each                     (title, view history)
//!     → Navigation handed to the rendering host
//! ```

pub mod history;
pub mod hooks;
pub mod navigator;
pub mod session;

pub use history::{ProgressSource, QuizProgress, ViewHistory, ViewHistoryEntry};
pub use hooks::{DocumentTitleHook, Guard, NavigationHook, ViewHistoryHook};
pub use navigator::{Navigation, NavigationError, Navigator, PendingNavigation};
pub use session::{NavigationOutcome, NavigationSession};
