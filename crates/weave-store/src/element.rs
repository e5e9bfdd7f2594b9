#![forbid(unsafe_code)]

//! Presentation-surface elements and their bindings to records.

use std::fmt;
use std::rc::Rc;

use weave_core::origin::{ChangeEvent, ElementId};
use weave_core::value::Value;

/// Something on the presentation surface that displays a record value.
///
/// Elements are passive: the store pushes values in through [`receive`].
/// An input element reports edits by calling
/// [`ModelStore::change`](crate::ModelStore::change) with
/// [`ChangeEvent::user_input`] so the store skips it on the way back out.
///
/// [`receive`]: Element::receive
pub trait Element {
    /// Stable identity used for origin checks and unbinding.
    fn id(&self) -> ElementId;

    /// Display `value`, pushed because of `event`.
    fn receive(&self, value: &Value, event: &ChangeEvent);
}

/// Shared element handle.
pub type ElementRef = Rc<dyn Element>;

/// One (element, optional sub-property path) pair on a record.
#[derive(Clone)]
pub struct Binding {
    element: ElementRef,
    segments: Vec<String>,
}

impl Binding {
    #[must_use]
    pub fn new(element: ElementRef, segments: Vec<String>) -> Self {
        Self { element, segments }
    }

    #[must_use]
    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    #[must_use]
    pub fn element_id(&self) -> ElementId {
        self.element.id()
    }

    /// Sub-property path inside the record value; empty for the whole value.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this binding targets the same element and sub-path.
    #[must_use]
    pub fn same_target(&self, element: ElementId, segments: &[String]) -> bool {
        self.element_id() == element && self.segments == segments
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("element", &self.element_id())
            .field("segments", &self.segments)
            .finish()
    }
}

/// A value ready to be pushed into one element.
pub(crate) struct Delivery {
    pub(crate) element: ElementRef,
    pub(crate) value: Value,
}

impl Delivery {
    pub(crate) fn send(&self, event: &ChangeEvent) {
        self.element.receive(&self.value, event);
    }
}
