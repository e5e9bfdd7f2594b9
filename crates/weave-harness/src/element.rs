#![forbid(unsafe_code)]

//! Elements that record what the store pushes into them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use weave_core::{ChangeEvent, ChangeOrigin, ElementId, Value};
use weave_store::{Element, ModelStore, StoreError};

/// Display-only element. Every pushed value is kept with its origin.
pub struct RecordingElement {
    id: ElementId,
    received: RefCell<Vec<(Value, ChangeOrigin)>>,
}

impl RecordingElement {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: ElementId::next(),
            received: RefCell::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn received(&self) -> Vec<(Value, ChangeOrigin)> {
        self.received.borrow().clone()
    }

    /// Most recently displayed value.
    #[must_use]
    pub fn shown(&self) -> Option<Value> {
        self.received.borrow().last().map(|(v, _)| v.clone())
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn clear(&self) {
        self.received.borrow_mut().clear();
    }
}

impl Element for RecordingElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn receive(&self, value: &Value, event: &ChangeEvent) {
        self.received
            .borrow_mut()
            .push((value.clone(), event.origin()));
    }
}

impl fmt::Debug for RecordingElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingElement")
            .field("id", &self.id)
            .field("received", &self.count())
            .finish()
    }
}

/// Editable element bound to one store key. Typing goes through
/// [`ModelStore::change`] tagged as user input from this element.
pub struct InputElement {
    inner: RecordingElement,
    store: ModelStore,
    key: String,
}

impl InputElement {
    #[must_use]
    pub fn new(store: &ModelStore, key: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            inner: RecordingElement {
                id: ElementId::next(),
                received: RefCell::new(Vec::new()),
            },
            store: store.clone(),
            key: key.into(),
        })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Report `value` as typed by the user.
    ///
    /// # Errors
    ///
    /// Whatever the store rejects the write with.
    pub fn type_text(&self, value: impl Into<Value>) -> Result<bool, StoreError> {
        self.store
            .change(&self.key, value.into(), ChangeEvent::user_input(self.inner.id))
    }

    #[must_use]
    pub fn received(&self) -> Vec<(Value, ChangeOrigin)> {
        self.inner.received()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.count()
    }

    #[must_use]
    pub fn shown(&self) -> Option<Value> {
        self.inner.shown()
    }
}

impl Element for InputElement {
    fn id(&self) -> ElementId {
        self.inner.id
    }

    fn receive(&self, value: &Value, event: &ChangeEvent) {
        self.inner.receive(value, event);
    }
}

impl fmt::Debug for InputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputElement")
            .field("id", &self.inner.id)
            .field("key", &self.key)
            .field("received", &self.inner.count())
            .finish()
    }
}
