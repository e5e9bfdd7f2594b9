#![forbid(unsafe_code)]

//! The application context.
//!
//! An [`App`] ties one model store, one render scheduler, one topic bus, one
//! surface and one clock together. Nothing is global: several apps may live
//! side by side.
//!
//! # Tick
//!
//! Time is driven by the host. Each [`tick`](App::tick):
//!
//! 1. Turns state changes since the last tick into debounced render
//!    requests, then enqueues those whose window has passed.
//! 2. Flushes the render queue if a flush is pending.
//! 3. Expires transient views whose liveness deadline has passed.
//!
//! Hosts call `tick` from their event loop, or sleep until
//! [`next_deadline`](App::next_deadline).

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};
use weave_core::bus::AUTH_LOGOUT;
use weave_core::{Clock, Instant, TopicBus, TopicHandle, Value};
use weave_store::ModelStore;
use weave_view::{
    FlushReport, RenderScheduler, RenderState, Surface, UiEvent, ViewError, ViewId, ViewNode,
};

use crate::collab::{Route, Router};
use crate::config::RuntimeConfig;
use crate::error::AppError;
use crate::session::{SessionMirror, SessionStorage};

/// Application context.
pub struct App {
    config: RuntimeConfig,
    store: ModelStore,
    scheduler: RenderScheduler,
    bus: TopicBus,
    surface: Box<dyn Surface>,
    clock: Rc<dyn Clock>,
    router: Option<Box<dyn Router>>,
    session: Option<(Rc<SessionMirror>, TopicHandle)>,
}

impl App {
    pub fn new(
        config: RuntimeConfig,
        surface: impl Surface + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        let store = ModelStore::with_config(config.history());
        let scheduler = RenderScheduler::new(store.clone(), config.scheduler());
        Self {
            config,
            store,
            scheduler,
            bus: TopicBus::new(),
            surface: Box::new(surface),
            clock: Rc::new(clock),
            router: None,
            session: None,
        }
    }

    #[must_use]
    pub fn with_router(mut self, router: impl Router + 'static) -> Self {
        self.router = Some(Box::new(router));
        self
    }

    /// Mirror the configured session keys into `storage`, seeding absent
    /// records from it. The mirror is forgotten on `auth.logout`.
    pub fn attach_session(&mut self, storage: impl SessionStorage + 'static) -> usize {
        if let Some((_, handle)) = self.session.take() {
            self.bus.unsubscribe(&handle);
        }
        let mirror = Rc::new(SessionMirror::attach(
            &self.store,
            storage,
            &self.config.session_keys,
        ));
        let seeded = mirror.seed(&self.store);
        let on_logout = Rc::clone(&mirror);
        let store = self.store.clone();
        let handle = self
            .bus
            .subscribe(AUTH_LOGOUT, move |_| on_logout.forget(&store));
        self.session = Some((mirror, handle));
        seeded
    }

    /// Drop session records from the store and storage.
    pub fn forget_session(&self) {
        if let Some((mirror, _)) = &self.session {
            mirror.forget(&self.store);
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    #[must_use]
    pub fn bus(&self) -> &TopicBus {
        &self.bus
    }

    #[must_use]
    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut RenderScheduler {
        &mut self.scheduler
    }

    #[must_use]
    pub fn surface(&self) -> &dyn Surface {
        &*self.surface
    }

    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    // -- views --------------------------------------------------------------

    /// Register a view. Writes to its local state request a render.
    ///
    /// # Errors
    ///
    /// [`AppError::View`] from registration.
    pub fn register(&mut self, node: ViewNode) -> Result<(), AppError> {
        Ok(self.scheduler.register(node)?)
    }

    /// Also request a render of `id` whenever the record behind `key`
    /// changes.
    ///
    /// # Errors
    ///
    /// [`AppError::Store`] for a malformed key, [`AppError::View`] for an
    /// unknown view.
    pub fn watch(&mut self, id: &ViewId, key: &str) -> Result<(), AppError> {
        Ok(self.scheduler.watch(id, key)?)
    }

    /// Remove a view and its subtree.
    pub fn unregister(&mut self, id: &ViewId) -> Vec<ViewId> {
        self.scheduler.unregister(id)
    }

    /// Write `value` at `path` inside view `id`'s local state (`""` for the
    /// whole state).
    ///
    /// # Errors
    ///
    /// [`AppError::View`] for an unknown view; [`AppError::Store`] when the
    /// path does not exist in the state.
    pub fn set_state(&self, id: &ViewId, path: &str, value: Value) -> Result<bool, AppError> {
        if !self.scheduler.contains(id.as_str()) {
            return Err(ViewError::UnknownView(id.clone()).into());
        }
        Ok(self.store.set(&state_path(id, path), value)?)
    }

    /// Snapshot of view `id`'s local state at `path`.
    #[must_use]
    pub fn state(&self, id: &ViewId, path: &str) -> Option<Value> {
        self.store.get(&state_path(id, path))
    }

    #[must_use]
    pub fn render_state(&self, id: &ViewId) -> RenderState {
        self.scheduler.render_state(id.as_str())
    }

    /// Debounced render request.
    pub fn must_render(&mut self, id: &ViewId) -> bool {
        let now = self.clock.now();
        self.scheduler.request_render(id, now)
    }

    /// Run one tick. See the module docs.
    pub fn tick(&mut self) -> FlushReport {
        let now = self.clock.now();
        self.scheduler.pump(now);

        let report = if self.scheduler.flush_pending() {
            self.scheduler.flush(&mut *self.surface, now)
        } else {
            FlushReport::default()
        };

        let expired = self.scheduler.check_liveness(&*self.surface, now);
        if !expired.is_empty() {
            debug!(count = expired.len(), "transient views expired");
        }
        report
    }

    /// Earliest instant at which [`tick`](Self::tick) has timed work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.scheduler.has_changes() || self.scheduler.flush_pending() {
            return Some(self.clock.now());
        }
        self.scheduler.next_due()
    }

    // -- events and bindings ------------------------------------------------

    /// Dispatch a UI event at view `id`, bubbling to its ancestors.
    pub fn dispatch(&self, id: &ViewId, name: &str, payload: Value) -> usize {
        self.scheduler.dispatch(id, &UiEvent::new(name, payload))
    }

    /// Bind the element at surface `anchor` to store `key`.
    ///
    /// # Errors
    ///
    /// [`AppError::NoElement`] when nothing bindable lives at the anchor;
    /// [`AppError::Store`] from the bind.
    pub fn bind(&self, key: &str, anchor: &str) -> Result<bool, AppError> {
        let element = self
            .surface
            .element(anchor)
            .ok_or_else(|| AppError::NoElement(anchor.to_owned()))?;
        Ok(self.store.bind(key, element)?)
    }

    /// Resolve `path` through the router: run its handler or publish
    /// `params` on its topic.
    ///
    /// # Errors
    ///
    /// [`AppError::NoRoute`] when no router is installed or nothing matches.
    pub fn navigate(&self, path: &str, params: &Value) -> Result<(), AppError> {
        let route = self
            .router
            .as_ref()
            .and_then(|router| router.resolve(path))
            .ok_or_else(|| AppError::NoRoute(path.to_owned()))?;
        match route {
            Route::Handler(handler) => handler(params),
            Route::Topic(topic) => {
                if self.bus.publish(&topic, params) == 0 {
                    warn!(path, %topic, "navigation topic has no subscribers");
                }
            }
        }
        debug!(path, "navigated");
        Ok(())
    }
}

fn state_path(id: &ViewId, path: &str) -> String {
    if path.is_empty() {
        id.state_key()
    } else {
        format!("{}.{path}", id.state_key())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
