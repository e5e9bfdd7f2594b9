#![forbid(unsafe_code)]

use std::cell::Cell;

use weave_core::Value;

/// A UI event dispatched to a view and bubbled to its ancestors.
#[derive(Debug)]
pub struct UiEvent {
    name: String,
    payload: Value,
    stopped: Cell<bool>,
}

impl UiEvent {
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
            stopped: Cell::new(false),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Stop bubbling after the current view's handlers.
    pub fn stop_propagation(&self) {
        self.stopped.set(true);
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}
