#![forbid(unsafe_code)]

//! A named, versioned value with bound elements and memento history.
//!
//! # Invariants
//!
//! 1. `history().current() == value()` at all times. The value is only
//!    produced by [`change`](BindableRecord::change) or a cursor move.
//! 2. `version` increments exactly once per accepted change or restore.
//! 3. A change that leaves the value equal to the current one is rejected:
//!    no version bump, no memento, no notification.
//! 4. Bindings are unique per (element, sub-path) and kept in insertion order.

use weave_core::origin::{ChangeEvent, ElementId};
use weave_core::path::{AccessError, read_at, write_at};
use weave_core::value::Value;

use crate::element::{Binding, Delivery, ElementRef};
use crate::history::{History, HistoryConfig};

/// One record of the model store.
#[derive(Debug)]
pub struct BindableRecord {
    name: String,
    value: Value,
    version: u64,
    bindings: Vec<Binding>,
    history: History<Value>,
}

impl BindableRecord {
    /// Create a record holding a snapshot of `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: &Value, config: HistoryConfig) -> Self {
        let value = value.snapshot();
        Self {
            name: name.into(),
            history: History::new(value.clone(), config),
            value,
            version: 0,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live view of the current value. Callers outside the store receive
    /// snapshots instead.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn history(&self) -> &History<Value> {
        &self.history
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Add a binding. Returns `false` for a duplicate (element, sub-path).
    pub fn bind(&mut self, element: ElementRef, segments: Vec<String>) -> bool {
        let id = element.id();
        if self.bindings.iter().any(|b| b.same_target(id, &segments)) {
            return false;
        }
        self.bindings.push(Binding::new(element, segments));
        true
    }

    /// Remove every binding of `element`. Returns how many were removed.
    pub fn unbind(&mut self, element: ElementId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.element_id() != element);
        before - self.bindings.len()
    }

    /// Apply `new` at `segments` and record a memento.
    ///
    /// Returns `Ok(false)` when the resulting value equals the current one.
    ///
    /// # Errors
    ///
    /// Propagates [`AccessError`] from the path write; the record is left
    /// untouched.
    pub fn change(&mut self, segments: &[String], new: Value) -> Result<bool, AccessError> {
        let mut next = self.value.clone();
        write_at(&mut next, segments, new.snapshot())?;
        if next == self.value {
            return Ok(false);
        }
        self.history.record(next.clone());
        self.value = next;
        self.version += 1;
        Ok(true)
    }

    /// Move the history cursor with `step`; on movement the value becomes the
    /// memento at the cursor.
    pub fn restore_with(&mut self, step: impl FnOnce(&mut History<Value>) -> bool) -> bool {
        if !step(&mut self.history) {
            return false;
        }
        self.value = self.history.current().clone();
        self.version += 1;
        true
    }

    /// The sub-value a binding should display; missing paths read as `Null`.
    #[must_use]
    pub fn value_for(&self, binding: &Binding) -> Value {
        read_at(&self.value, binding.segments())
            .map(Value::snapshot)
            .unwrap_or_default()
    }

    /// Values to push for `event`, skipping the originating element.
    pub(crate) fn deliveries(&self, event: &ChangeEvent) -> Vec<Delivery> {
        self.bindings
            .iter()
            .filter(|b| !event.skips(b.element_id()))
            .map(|b| Delivery {
                element: b.element().clone(),
                value: self.value_for(b),
            })
            .collect()
    }

    /// Delivery for the most recent binding of `element` at `segments`.
    pub(crate) fn delivery_for(&self, element: ElementId, segments: &[String]) -> Option<Delivery> {
        self.bindings
            .iter()
            .find(|b| b.same_target(element, segments))
            .map(|b| Delivery {
                element: b.element().clone(),
                value: self.value_for(b),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BindableRecord {
        BindableRecord::new(
            "form",
            &Value::from_pairs([("title", "draft")]),
            HistoryConfig::default(),
        )
    }

    #[test]
    fn change_records_memento_and_bumps_version() {
        let mut r = record();
        assert!(r.change(&["title".into()], "final".into()).unwrap());
        assert_eq!(r.version(), 1);
        assert_eq!(r.history().len(), 2);
        assert_eq!(r.history().current(), r.value());
    }

    #[test]
    fn equal_change_is_rejected() {
        let mut r = record();
        assert!(!r.change(&["title".into()], "draft".into()).unwrap());
        assert_eq!(r.version(), 0);
        assert_eq!(r.history().len(), 1);
    }

    #[test]
    fn rewriting_nan_is_rejected() {
        let mut r = record();
        assert!(r.change(&["title".into()], Value::Float(f64::NAN)).unwrap());
        assert!(!r.change(&["title".into()], Value::Float(f64::NAN)).unwrap());
        assert_eq!(r.version(), 1);
        assert_eq!(r.history().len(), 2);
    }

    #[test]
    fn failed_change_leaves_record_untouched() {
        let mut r = record();
        let err = r.change(&["body".into()], "x".into()).unwrap_err();
        assert!(matches!(err, AccessError::UndefinedProperty { .. }));
        assert_eq!(r.version(), 0);
        assert_eq!(r.history().len(), 1);
    }

    #[test]
    fn restore_moves_value_to_cursor() {
        let mut r = record();
        r.change(&[], Value::from_pairs([("title", "b")])).unwrap();
        assert!(r.restore_with(History::undo));
        assert_eq!(r.value().property("title"), Some(&Value::from("draft")));
        assert_eq!(r.version(), 2);
        assert!(!r.restore_with(History::undo));
        assert_eq!(r.version(), 2);
    }
}
