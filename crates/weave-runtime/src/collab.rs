#![forbid(unsafe_code)]

//! Contracts for collaborators outside the reactive core.
//!
//! - [`Remote`]: asynchronous calls to a backend.
//! - [`EntityCache`]: shared entities keyed by id, announced on the bus.
//! - [`DataProvider`]: turns bus payloads into view state writes.
//! - [`Router`]: maps navigation paths to handlers or bus topics.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};
use weave_core::bus::{
    AUTH_LOGIN, AUTH_LOGOUT, AUTH_REFRESH, AUTH_SESSION_TIMEOUT, CACHE_CHANGED, ENTITY_CHANGED,
};
use weave_core::{Map, Path, TopicBus, TopicHandle, Value};
use weave_store::ModelStore;
use weave_view::ViewId;

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Remote
// ---------------------------------------------------------------------------

/// Failure of a remote call. Never retried by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The backend could not be reached.
    Unreachable(String),
    /// The backend answered with an error status.
    Status { code: u16, message: String },
    /// The session is missing or expired.
    Unauthorized,
    /// The response body could not be decoded.
    Decode(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable(target) => write!(f, "backend unreachable: {target}"),
            Self::Status { code, message } => write!(f, "status {code}: {message}"),
            Self::Unauthorized => f.write_str("unauthorized"),
            Self::Decode(detail) => write!(f, "undecodable response: {detail}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// A backend reachable through named actions.
#[allow(async_fn_in_trait)]
pub trait Remote {
    async fn invoke(&self, action: &str, params: Value) -> Result<Value, TransportError>;
}

/// Call `action` and write the result to `key`, provided the target record
/// still exists once the call returns.
///
/// Returns `Ok(false)` when the record was destroyed while the call was in
/// flight; the result is then discarded.
///
/// # Errors
///
/// [`AppError::Transport`] from the call, [`AppError::Store`] from the write.
pub async fn load_into<R: Remote + ?Sized>(
    remote: &R,
    store: &ModelStore,
    key: &str,
    action: &str,
    params: Value,
) -> Result<bool, AppError> {
    let path = Path::parse(key)?;
    let result = remote.invoke(action, params).await?;
    if !store.contains(path.name()) {
        debug!(key, action, "load target gone; result discarded");
        return Ok(false);
    }
    store.set(key, result)?;
    Ok(true)
}

/// Authentication lifecycle announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthEvent {
    Login,
    Logout,
    Refresh,
    SessionTimeout,
}

impl AuthEvent {
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::Login => AUTH_LOGIN,
            Self::Logout => AUTH_LOGOUT,
            Self::Refresh => AUTH_REFRESH,
            Self::SessionTimeout => AUTH_SESSION_TIMEOUT,
        }
    }

    /// Publish on `bus`, returning the number of subscribers reached.
    pub fn announce(self, bus: &TopicBus, payload: &Value) -> usize {
        bus.publish(self.topic(), payload)
    }
}

// ---------------------------------------------------------------------------
// Entity cache
// ---------------------------------------------------------------------------

/// Shared entities keyed by id.
pub trait EntityCache {
    /// Entities for `ids`; unknown ids are absent from the result.
    fn read_many(&self, ids: &[&str]) -> Map;

    /// Insert or replace entities. Returns the ids whose value changed.
    fn merge(&mut self, items: Map) -> Vec<String>;
}

/// In-memory [`EntityCache`] that announces changes on a bus.
///
/// Each changed entity publishes `entityChanged` with `{ id, value }`; a
/// merge that changed anything then publishes `cacheChanged` with the list of
/// changed ids.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, Value>,
    bus: Option<TopicBus>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn announcing(bus: TopicBus) -> Self {
        Self {
            entries: BTreeMap::new(),
            bus: Some(bus),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntityCache for MemoryCache {
    fn read_many(&self, ids: &[&str]) -> Map {
        ids.iter()
            .filter_map(|id| {
                self.entries
                    .get(*id)
                    .map(|v| ((*id).to_owned(), v.snapshot()))
            })
            .collect()
    }

    fn merge(&mut self, items: Map) -> Vec<String> {
        let mut changed = Vec::new();
        for (id, value) in items {
            let value = value.snapshot();
            if self.entries.get(&id) == Some(&value) {
                continue;
            }
            if let Some(bus) = &self.bus {
                bus.publish(
                    ENTITY_CHANGED,
                    &Value::from_pairs([("id", Value::from(id.as_str())), ("value", value.clone())]),
                );
            }
            self.entries.insert(id.clone(), value);
            changed.push(id);
        }
        if !changed.is_empty()
            && let Some(bus) = &self.bus
        {
            let ids: Vec<Value> = changed.iter().map(|id| Value::from(id.as_str())).collect();
            bus.publish(CACHE_CHANGED, &Value::List(ids));
        }
        changed
    }
}

// ---------------------------------------------------------------------------
// Data provider
// ---------------------------------------------------------------------------

/// Bus subscription that writes payloads into a view's local state.
///
/// `translate` maps a payload to `(path, value)` pairs relative to the view
/// state (`""` for the whole state). Writes that fail are logged and skipped.
/// Dropping the provider unsubscribes it.
pub struct DataProvider {
    bus: TopicBus,
    handle: TopicHandle,
    view: ViewId,
}

impl DataProvider {
    pub fn connect(
        bus: &TopicBus,
        topic: &str,
        store: ModelStore,
        view: ViewId,
        translate: impl Fn(&Value) -> Vec<(String, Value)> + 'static,
    ) -> Self {
        let state_key = view.state_key();
        let handle = bus.subscribe(topic, move |payload| {
            for (path, value) in translate(payload) {
                let key = if path.is_empty() {
                    state_key.clone()
                } else {
                    format!("{state_key}.{path}")
                };
                if let Err(err) = store.set(&key, value) {
                    warn!(%key, %err, "data provider write rejected");
                }
            }
        });
        Self {
            bus: bus.clone(),
            handle,
            view,
        }
    }

    #[must_use]
    pub fn view(&self) -> &ViewId {
        &self.view
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        self.handle.topic()
    }
}

impl Drop for DataProvider {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.handle);
    }
}

impl fmt::Debug for DataProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProvider")
            .field("topic", &self.handle.topic())
            .field("view", &self.view)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// What a navigation path resolves to.
#[derive(Clone)]
pub enum Route {
    /// Run a handler with the navigation parameters.
    Handler(Rc<dyn Fn(&Value)>),
    /// Publish the parameters on a bus topic.
    Topic(String),
}

impl Route {
    pub fn handler(f: impl Fn(&Value) + 'static) -> Self {
        Self::Handler(Rc::new(f))
    }

    pub fn topic(topic: impl Into<String>) -> Self {
        Self::Topic(topic.into())
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Route::Handler"),
            Self::Topic(topic) => f.debug_tuple("Route::Topic").field(topic).finish(),
        }
    }
}

pub trait Router {
    fn resolve(&self, path: &str) -> Option<Route>;
}

/// Ordered route table. A pattern ending in `/*` matches any path below its
/// prefix; otherwise matching is exact. The first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<(String, Route)>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, route: Route) -> Self {
        self.routes.push((pattern.into(), route));
        self
    }

    fn matches(pattern: &str, path: &str) -> bool {
        match pattern.strip_suffix("/*") {
            Some(prefix) => path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/')),
            None => pattern == path,
        }
    }
}

impl Router for RouteTable {
    fn resolve(&self, path: &str) -> Option<Route> {
        self.routes
            .iter()
            .find(|(pattern, _)| Self::matches(pattern, path))
            .map(|(_, route)| route.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn memory_cache_announces_changes() {
        let bus = TopicBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for topic in [ENTITY_CHANGED, CACHE_CHANGED] {
            let seen = Rc::clone(&seen);
            bus.subscribe(topic, move |payload| {
                seen.borrow_mut().push((topic, payload.clone()));
            });
        }
        let mut cache = MemoryCache::announcing(bus);
        let mut items = Map::new();
        items.insert("p1".into(), Value::from_pairs([("name", "Pen")]));
        assert_eq!(cache.merge(items.clone()), ["p1"]);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(seen.borrow()[1].0, CACHE_CHANGED);

        assert!(cache.merge(items).is_empty(), "unchanged merge is silent");
        assert_eq!(seen.borrow().len(), 2);

        let read = cache.read_many(&["p1", "missing"]);
        assert_eq!(read.len(), 1);
    }

    #[test]
    fn data_provider_writes_view_state() {
        let bus = TopicBus::new();
        let store = ModelStore::new();
        store
            .create("view:cart", Value::from_pairs([("count", 0)]), None)
            .unwrap();
        let provider = DataProvider::connect(
            &bus,
            CACHE_CHANGED,
            store.clone(),
            ViewId::new("cart").unwrap(),
            |payload| {
                let n = payload.as_list().map_or(0, <[Value]>::len);
                vec![("count".to_owned(), Value::from(n as i64))]
            },
        );
        bus.publish(CACHE_CHANGED, &Value::List(vec!["a".into(), "b".into()]));
        assert_eq!(store.get("view:cart.count"), Some(Value::Int(2)));

        drop(provider);
        assert_eq!(bus.subscriber_count(CACHE_CHANGED), 0);
    }

    #[test]
    fn route_table_matching() {
        let table = RouteTable::new()
            .route("/orders/*", Route::topic("nav.orders"))
            .route("/", Route::handler(|_| {}));
        assert!(matches!(table.resolve("/orders/42"), Some(Route::Topic(t)) if t == "nav.orders"));
        assert!(matches!(table.resolve("/"), Some(Route::Handler(_))));
        assert!(table.resolve("/orders").is_none());
        assert!(table.resolve("/ordersx/1").is_none());
    }
}
