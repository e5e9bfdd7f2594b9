#![forbid(unsafe_code)]

//! Trailing-edge debouncer for render requests.
//!
//! Each key carries one deadline. A repeated request resets it, so a burst of
//! requests closer together than the window yields a single due key.

use std::time::Duration;

use web_time::Instant;

/// Default debounce window for render requests.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(18);

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    window: Duration,
    pending: Vec<(K, Instant)>,
}

impl<K: PartialEq> Debouncer<K> {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Request `key` at `now`. Returns `true` if it was not already pending.
    pub fn request(&mut self, key: K, now: Instant) -> bool {
        let fresh = self.cancel(&key).is_none();
        self.pending.push((key, now + self.window));
        fresh
    }

    /// Drop a pending request, returning its deadline.
    pub fn cancel(&mut self, key: &K) -> Option<Instant> {
        let pos = self.pending.iter().position(|(k, _)| k == key)?;
        Some(self.pending.remove(pos).1)
    }

    /// Remove and return keys whose deadline has passed, oldest request first.
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].1 <= now {
                due.push(self.pending.remove(i).0);
            } else {
                i += 1;
            }
        }
        due
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, at)| *at).min()
    }

    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.iter().any(|(k, _)| k == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<K: PartialEq> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
