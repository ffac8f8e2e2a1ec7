//! View history for resumable study views.
//!
//! Records the last position in views such as quiz and review so a client can
//! pick up where it left off.

use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Last recorded visit to a tracked view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewHistoryEntry {
    /// History key, e.g. `quiz`.
    pub view: String,
    /// Path of the last visit.
    pub path: String,
    /// Question index reported by the progress source at that time.
    pub current_index: usize,
    pub visits: u64,
    /// Seconds since epoch.
    pub updated_at: u64,
}

/// Thread-safe store of view history entries.
#[derive(Debug, Default)]
pub struct ViewHistory {
    entries: DashMap<String, ViewHistoryEntry>,
}

impl ViewHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit, bumping the visit count of an existing entry.
    pub fn record(&self, view: &str, path: &str, current_index: usize) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        self.entries
            .entry(view.to_string())
            .and_modify(|e| {
                e.path = path.to_string();
                e.current_index = current_index;
                e.visits += 1;
                e.updated_at = now;
            })
            .or_insert_with(|| ViewHistoryEntry {
                view: view.to_string(),
                path: path.to_string(),
                current_index,
                visits: 1,
                updated_at: now,
            });

        tracing::debug!(view, path, current_index, "View history updated");
    }

    pub fn get(&self, view: &str) -> Option<ViewHistoryEntry> {
        self.entries.get(view).map(|r| r.value().clone())
    }

    /// All entries ordered by view key.
    pub fn snapshot(&self) -> Vec<ViewHistoryEntry> {
        let mut entries: Vec<_> = self.entries.iter().map(|r| r.value().clone()).collect();
        entries.sort_by(|a, b| a.view.cmp(&b.view));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Supplies the current question index of a view.
pub trait ProgressSource: Send + Sync + std::fmt::Debug {
    fn current_index(&self, view: &str) -> usize;
}

/// In-memory progress, updated by whoever drives the quiz.
#[derive(Debug, Default)]
pub struct QuizProgress {
    indices: DashMap<String, usize>,
}

impl QuizProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, view: &str, index: usize) {
        self.indices.insert(view.to_string(), index);
    }
}

impl ProgressSource for QuizProgress {
    fn current_index(&self, view: &str) -> usize {
        self.indices.get(view).map(|r| *r.value()).unwrap_or(0)
    }
}
