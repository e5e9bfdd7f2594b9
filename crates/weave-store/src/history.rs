#![forbid(unsafe_code)]

//! Bounded memento history with an undo/redo cursor.
//!
//! ```text
//!   oldest                         newest
//!   ┌─────┬─────┬─────┬─────┬─────┐
//!   │  m0 │  m1 │  m2 │  m3 │  m4 │
//!   └─────┴─────┴──▲──┴─────┴─────┘
//!                  cursor          (m3, m4 are redoable)
//! ```
//!
//! # Invariants
//!
//! 1. The history is never empty and `cursor < len()`.
//! 2. `len() <= max_depth()`. When full, the oldest memento is evicted before
//!    a new one is appended.
//! 3. Recording after an undo discards the redoable tail.
//! 4. Cursor moves clamp at both ends and report whether they moved.

use std::collections::VecDeque;

/// Default maximum number of mementos per record.
pub const DEFAULT_HISTORY_DEPTH: usize = 20;

/// History sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum mementos kept. Values below 1 are treated as 1.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

/// Ordered mementos plus the current position.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<T>,
    cursor: usize,
    max_depth: usize,
}

impl<T> History<T> {
    /// Start a history seeded with one memento.
    #[must_use]
    pub fn new(initial: T, config: HistoryConfig) -> Self {
        let mut entries = VecDeque::with_capacity(config.max_depth.clamp(1, 64));
        entries.push_back(initial);
        Self {
            entries,
            cursor: 0,
            max_depth: config.max_depth.max(1),
        }
    }

    /// Append a memento at the cursor, discarding any redoable tail.
    pub fn record(&mut self, entry: T) {
        self.entries.truncate(self.cursor + 1);
        if self.entries.len() >= self.max_depth {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.cursor = self.entries.len() - 1;
    }

    /// The memento at the cursor.
    #[must_use]
    pub fn current(&self) -> &T {
        &self.entries[self.cursor]
    }

    /// Step back one memento.
    pub fn undo(&mut self) -> bool {
        self.move_to(self.cursor.saturating_sub(1))
    }

    /// Step forward one memento.
    pub fn redo(&mut self) -> bool {
        self.move_to(self.cursor + 1)
    }

    /// Jump to the oldest memento.
    pub fn rewind(&mut self) -> bool {
        self.move_to(0)
    }

    /// Jump to the newest memento.
    pub fn fast_forward(&mut self) -> bool {
        self.move_to(self.entries.len() - 1)
    }

    fn move_to(&mut self, target: usize) -> bool {
        let target = target.min(self.entries.len() - 1);
        let moved = target != self.cursor;
        self.cursor = target;
        moved
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a history holds at least one memento.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Mementos from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(depth: usize) -> History<i32> {
        History::new(0, HistoryConfig::with_max_depth(depth))
    }

    #[test]
    fn seeded_with_one_entry() {
        let h = history(5);
        assert_eq!(h.len(), 1);
        assert_eq!(h.cursor(), 0);
        assert_eq!(*h.current(), 0);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }

    #[test]
    fn record_moves_cursor_to_end() {
        let mut h = history(5);
        h.record(1);
        h.record(2);
        assert_eq!(h.len(), 3);
        assert_eq!(h.cursor(), 2);
        assert_eq!(*h.current(), 2);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut h = history(3);
        for v in 1..=5 {
            h.record(v);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), [3, 4, 5]);
        assert_eq!(h.cursor(), 2);
    }

    #[test]
    fn undo_redo_clamp() {
        let mut h = history(5);
        h.record(1);
        assert!(h.undo());
        assert!(!h.undo(), "undo at oldest clamps");
        assert_eq!(*h.current(), 0);
        assert!(h.redo());
        assert!(!h.redo(), "redo at newest clamps");
        assert_eq!(*h.current(), 1);
    }

    #[test]
    fn rewind_and_fast_forward() {
        let mut h = history(5);
        h.record(1);
        h.record(2);
        assert!(h.rewind());
        assert_eq!(*h.current(), 0);
        assert!(!h.rewind());
        assert!(h.fast_forward());
        assert_eq!(*h.current(), 2);
        assert!(!h.fast_forward());
    }

    #[test]
    fn record_after_undo_drops_redo_tail() {
        let mut h = history(5);
        h.record(1);
        h.record(2);
        h.undo();
        h.undo();
        h.record(9);
        assert_eq!(h.iter().copied().collect::<Vec<_>>(), [0, 9]);
        assert!(!h.can_redo());
    }

    #[test]
    fn zero_depth_treated_as_one() {
        let mut h = history(0);
        h.record(1);
        assert_eq!(h.len(), 1);
        assert_eq!(*h.current(), 1);
    }
}
