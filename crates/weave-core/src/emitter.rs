#![forbid(unsafe_code)]

//! The `on` / `off` / `fire_event` capability shared by Weave components.
//!
//! [`Emitter`] is a handler table keyed by event. Components embed one and
//! implement [`EventEmitter`] by pointing at it; the trait supplies `on`,
//! `off`, and `fire_event` for free.
//!
//! # Invariants
//!
//! 1. Handlers for one key run in registration order.
//! 2. `fire` snapshots the matching handlers before invoking any of them, so
//!    a handler that registers or removes handlers affects only later fires.
//! 3. Handler ids are never reused within one emitter.

use std::fmt;
use std::rc::Rc;

/// Identifier returned by [`Emitter::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Shared handler function.
pub type Handler<P> = Rc<dyn Fn(&P)>;

struct Entry<K, P: ?Sized> {
    id: HandlerId,
    key: K,
    handler: Handler<P>,
}

/// Ordered handler table.
pub struct Emitter<K, P: ?Sized> {
    next_id: u64,
    entries: Vec<Entry<K, P>>,
}

impl<K, P: ?Sized> Default for Emitter<K, P> {
    fn default() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

impl<K: PartialEq, P: ?Sized> Emitter<K, P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key`.
    pub fn on(&mut self, key: K, handler: impl Fn(&P) + 'static) -> HandlerId {
        self.on_shared(key, Rc::new(handler))
    }

    /// Register an already shared handler.
    pub fn on_shared(&mut self, key: K, handler: Handler<P>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, key, handler });
        id
    }

    /// Remove one handler. Returns `false` if it was not registered.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Remove every handler for `key`, returning how many were removed.
    pub fn off_key(&mut self, key: &K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != *key);
        before - self.entries.len()
    }

    /// Handlers registered for `key`, in registration order.
    #[must_use]
    pub fn handlers_for(&self, key: &K) -> Vec<Handler<P>> {
        self.entries
            .iter()
            .filter(|e| e.key == *key)
            .map(|e| Rc::clone(&e.handler))
            .collect()
    }

    /// Invoke every handler for `key`. Returns the number invoked.
    pub fn fire(&self, key: &K, payload: &P) -> usize {
        let handlers = self.handlers_for(key);
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    #[must_use]
    pub fn has_handlers(&self, key: &K) -> bool {
        self.entries.iter().any(|e| e.key == *key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K, P: ?Sized> fmt::Debug for Emitter<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("handler_count", &self.entries.len())
            .finish()
    }
}

/// Composable event capability.
///
/// Implementors expose their embedded [`Emitter`]; the provided methods do
/// the rest.
///
/// ```
/// use weave_core::emitter::{Emitter, EventEmitter};
///
/// #[derive(Default)]
/// struct Button {
///     events: Emitter<&'static str, u32>,
/// }
///
/// impl EventEmitter for Button {
///     type Key = &'static str;
///     type Payload = u32;
///     fn emitter(&self) -> &Emitter<&'static str, u32> { &self.events }
///     fn emitter_mut(&mut self) -> &mut Emitter<&'static str, u32> { &mut self.events }
/// }
///
/// let mut button = Button::default();
/// button.on("click", |clicks| assert_eq!(*clicks, 2));
/// assert_eq!(button.fire_event(&"click", &2), 1);
/// ```
pub trait EventEmitter {
    type Key: PartialEq;
    type Payload: ?Sized;

    fn emitter(&self) -> &Emitter<Self::Key, Self::Payload>;

    fn emitter_mut(&mut self) -> &mut Emitter<Self::Key, Self::Payload>;

    fn on(&mut self, key: Self::Key, handler: impl Fn(&Self::Payload) + 'static) -> HandlerId {
        self.emitter_mut().on(key, handler)
    }

    fn off(&mut self, id: HandlerId) -> bool {
        self.emitter_mut().off(id)
    }

    fn fire_event(&self, key: &Self::Key, payload: &Self::Payload) -> usize {
        self.emitter().fire(key, payload)
    }
}
