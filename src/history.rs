use chrono::{DateTime, Utc};
use log::debug;

use crate::cue::Cue;

// @module: Undo/redo over whole-store snapshots

/// Default number of snapshots kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

// @struct: One recorded state
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    // @field: What produced this state
    pub description: String,

    // @field: When it was recorded
    pub timestamp: DateTime<Utc>,

    // @field: Store contents at that point
    pub cues: Vec<Cue>,
}

/// Bounded linear history with a movable cursor
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    // Index of the current entry; meaningless while `entries` is empty
    cursor: usize,
    capacity: usize,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new state. Drops any redo tail first; skips unchanged snapshots.
    /// Returns whether an entry was added.
    pub fn record(&mut self, description: impl Into<String>, cues: &[Cue]) -> bool {
        if self.current().is_some_and(|entry| entry.cues == cues) {
            return false;
        }

        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }

        self.entries.push(HistoryEntry {
            description: description.into(),
            timestamp: Utc::now(),
            cues: cues.to_vec(),
        });

        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
            debug!("History full, evicted {} oldest entries", overflow);
        }

        self.cursor = self.entries.len() - 1;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.entries.is_empty() && self.cursor + 1 < self.entries.len()
    }

    /// Step back and return the state to load
    pub fn undo(&mut self) -> Option<&[Cue]> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current().map(|entry| entry.cues.as_slice())
    }

    /// Step forward and return the state to load
    pub fn redo(&mut self) -> Option<&[Cue]> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current().map(|entry| entry.cues.as_slice())
    }

    /// Jump to any recorded entry
    pub fn go_to(&mut self, index: usize) -> Option<&[Cue]> {
        if index >= self.entries.len() {
            return None;
        }
        self.cursor = index;
        self.current().map(|entry| entry.cues.as_slice())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn current_index(&self) -> Option<usize> {
        if self.entries.is_empty() { None } else { Some(self.cursor) }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}
