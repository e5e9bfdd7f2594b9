#![forbid(unsafe_code)]

//! Synchronous topic bus.
//!
//! Collaborators (session, entity cache, router) announce events on named
//! topics; views and providers subscribe.
//!
//! # Invariants
//!
//! 1. Delivery is synchronous: `publish` returns after every subscriber ran.
//! 2. Subscribers for one topic run in registration order.
//! 3. Publishing to a topic nobody subscribed to is a no-op, not an error.
//! 4. Subscribers may publish or (un)subscribe re-entrantly; the handler list
//!    is snapshotted before delivery.
//!
//! Cloning a [`TopicBus`] yields another handle to the same bus.

use std::cell::RefCell;
use std::rc::Rc;

use crate::emitter::{Emitter, HandlerId};
use crate::value::Value;

/// Session-start topic.
pub const AUTH_LOGIN: &str = "auth.login";
/// Session-end topic.
pub const AUTH_LOGOUT: &str = "auth.logout";
/// Token refreshed.
pub const AUTH_REFRESH: &str = "auth.refresh";
/// Session expired on the remote side.
pub const AUTH_SESSION_TIMEOUT: &str = "auth.sessionTimeout";
/// Entity cache contents changed.
pub const CACHE_CHANGED: &str = "cacheChanged";
/// A single entity changed.
pub const ENTITY_CHANGED: &str = "entityChanged";

/// Handle returned by [`TopicBus::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicHandle {
    topic: String,
    id: HandlerId,
}

impl TopicHandle {
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Shared publish/subscribe bus.
#[derive(Clone, Default)]
pub struct TopicBus {
    inner: Rc<RefCell<Emitter<String, Value>>>,
}

impl TopicBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `topic`.
    pub fn subscribe(&self, topic: &str, handler: impl Fn(&Value) + 'static) -> TopicHandle {
        let id = self.inner.borrow_mut().on(topic.to_owned(), handler);
        TopicHandle {
            topic: topic.to_owned(),
            id,
        }
    }

    /// Remove a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, handle: &TopicHandle) -> bool {
        self.inner.borrow_mut().off(handle.id)
    }

    /// Deliver `payload` to every subscriber of `topic`. Returns the number
    /// of subscribers reached.
    pub fn publish(&self, topic: &str, payload: &Value) -> usize {
        let handlers = self.inner.borrow().handlers_for(&topic.to_owned());
        #[cfg(feature = "tracing")]
        tracing::trace!(topic, subscribers = handlers.len(), "bus publish");
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    /// Number of subscribers on `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.borrow().handlers_for(&topic.to_owned()).len()
    }
}

impl std::fmt::Debug for TopicBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicBus")
            .field("subscriptions", &self.inner.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn publish_reaches_subscribers_in_order() {
        let bus = TopicBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let log = Rc::clone(&log);
            bus.subscribe("t", move |v| log.borrow_mut().push((n, v.clone())));
        }
        assert_eq!(bus.publish("t", &Value::Int(7)), 3);
        assert_eq!(
            *log.borrow(),
            vec![(0, Value::Int(7)), (1, Value::Int(7)), (2, Value::Int(7))]
        );
    }

    #[test]
    fn missing_topic_is_noop() {
        let bus = TopicBus::new();
        assert_eq!(bus.publish("nobody", &Value::Null), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = TopicBus::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let handle = bus.subscribe(AUTH_LOGIN, move |_| h.set(h.get() + 1));
        bus.publish(AUTH_LOGIN, &Value::Null);
        assert!(bus.unsubscribe(&handle));
        assert!(!bus.unsubscribe(&handle));
        bus.publish(AUTH_LOGIN, &Value::Null);
        assert_eq!(hits.get(), 1);
        assert_eq!(handle.topic(), AUTH_LOGIN);
    }

    #[test]
    fn subscriber_may_publish_reentrantly() {
        let bus = TopicBus::new();
        let seen = Rc::new(Cell::new(false));
        let inner_bus = bus.clone();
        bus.subscribe("outer", move |_| {
            inner_bus.publish("inner", &Value::Null);
        });
        let s = Rc::clone(&seen);
        bus.subscribe("inner", move |_| s.set(true));
        bus.publish("outer", &Value::Null);
        assert!(seen.get());
    }

    #[test]
    fn clones_share_subscriptions() {
        let bus = TopicBus::new();
        let other = bus.clone();
        other.subscribe("t", |_| {});
        assert_eq!(bus.subscriber_count("t"), 1);
    }
}
