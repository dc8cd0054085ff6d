//! Bounded, timestamped log history.

use chrono::{DateTime, Local};

/// Length above which the history is truncated.
pub const DEFAULT_MAX_ENTRIES: usize = 5_000;

/// Entries kept when the history is truncated.
pub const DEFAULT_RETAIN_ENTRIES: usize = 2_000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only log of `"[timestamp] text"` lines.
///
/// Once the length exceeds `max_entries`, everything but the newest
/// `retain_entries` lines is dropped.
#[derive(Debug, Clone)]
pub struct LogHistory {
    entries: Vec<String>,
    max_entries: usize,
    retain_entries: usize,
}

impl LogHistory {
    /// Creates an empty history with the given bounds.
    ///
    /// `retain_entries` is clamped to `max_entries`.
    #[must_use]
    pub fn new(max_entries: usize, retain_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            retain_entries: retain_entries.min(max_entries),
        }
    }

    /// Appends `text` stamped with the current local time.
    pub fn append(&mut self, text: &str) {
        self.append_at(Local::now(), text);
    }

    /// Appends `text` stamped with `at`.
    pub fn append_at(&mut self, at: DateTime<Local>, text: &str) {
        self.entries
            .push(format!("[{}] {text}", at.format(TIMESTAMP_FORMAT)));
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.retain_entries;
            self.entries.drain(..excess);
        }
    }

    /// Newest `n` entries, oldest first.
    #[must_use]
    pub fn tail(&self, n: usize) -> &[String] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_RETAIN_ENTRIES)
    }
}
