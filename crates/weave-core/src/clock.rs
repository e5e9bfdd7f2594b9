#![forbid(unsafe_code)]

//! Monotonic time sources.
//!
//! Debounce windows and liveness deadlines are measured against a [`Clock`].
//! Hosts use [`SystemClock`]; tests drive a [`ManualClock`] so timing is
//! deterministic.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

pub use web_time::Instant;

/// A monotonic time source.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock monotonic time (`performance.now()` on wasm).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.offset.get()
    }
}
