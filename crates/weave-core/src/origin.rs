#![forbid(unsafe_code)]

//! Change events: why a mutation happened and who caused it.
//!
//! Every propagation through the store carries a [`ChangeEvent`]. The event
//! decides which bound elements are skipped on the way back out:
//!
//! - [`ChangeOrigin::UserInput`] names a source element; that element already
//!   shows the new value and is excluded from the notify-back pass.
//! - [`ChangeOrigin::ProgrammaticSet`] has no source; every binding is notified.
//! - [`ChangeOrigin::Restore`] is used by undo/redo. Restores are never
//!   recorded as new history and never skipped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for element ids.
static ELEMENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a presentation-surface element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Allocate a fresh, process-unique element id.
    #[must_use]
    pub fn next() -> Self {
        Self(ELEMENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// What kind of actor caused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOrigin {
    /// A bound element reported new input.
    UserInput,
    /// Application code called `set`.
    ProgrammaticSet,
    /// A history cursor move pushed a memento back out.
    Restore,
}

/// Immutable tag attached to one propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    origin: ChangeOrigin,
    source: Option<ElementId>,
}

impl ChangeEvent {
    /// A change typed into `source`.
    #[must_use]
    pub const fn user_input(source: ElementId) -> Self {
        Self {
            origin: ChangeOrigin::UserInput,
            source: Some(source),
        }
    }

    /// A change made by application code.
    #[must_use]
    pub const fn programmatic() -> Self {
        Self {
            origin: ChangeOrigin::ProgrammaticSet,
            source: None,
        }
    }

    /// A history restore.
    #[must_use]
    pub const fn restore() -> Self {
        Self {
            origin: ChangeOrigin::Restore,
            source: None,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ChangeOrigin {
        self.origin
    }

    #[must_use]
    pub const fn source(&self) -> Option<ElementId> {
        self.source
    }

    #[must_use]
    pub fn is_restore(&self) -> bool {
        self.origin == ChangeOrigin::Restore
    }

    /// Whether `element` must be skipped when pushing this change back out.
    #[must_use]
    pub fn skips(&self, element: ElementId) -> bool {
        !self.is_restore() && self.source == Some(element)
    }
}
