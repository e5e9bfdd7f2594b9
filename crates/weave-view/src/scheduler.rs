#![forbid(unsafe_code)]

//! Hierarchy-aware render scheduler.
//!
//! The scheduler owns the view tree and a queue of views waiting to render.
//! Requests arrive two ways:
//!
//! - [`request_render`](RenderScheduler::request_render) is debounced; the
//!   host calls [`pump`](RenderScheduler::pump) to move due requests into the
//!   queue.
//! - [`enqueue`](RenderScheduler::enqueue) goes straight to the queue.
//!
//! Writes to a view's local state (`view:<id>`), or to any record the view
//! [`watch`](RenderScheduler::watch)es, count as a debounced request raised
//! at the next `pump`.
//!
//! # Queue rules
//!
//! 1. During a flush every request is deferred and re-enqueued after it.
//! 2. A view already queued is not queued twice.
//! 3. A view whose ancestor is queued is dropped (ancestor wins).
//! 4. Queuing a view removes its queued descendants (descendant superseded).
//! 5. Root views go to the front of the queue; others to the back.
//!
//! # Render pass
//!
//! Rendering a view patches its anchor, fires [`Lifecycle::Rendered`], then
//! re-renders every child whose anchor is addressable below it and resolves.
//! A queued view whose anchor does not resolve is logged, detached, and
//! unregistered; the flush continues with the next view.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use tracing::{debug, debug_span, error, trace, warn};
use weave_core::emitter::{Emitter, EventEmitter};
use weave_core::{Path, Value};
use weave_store::{ModelStore, StoreError, Subscription};
use web_time::Instant;

use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};
use crate::error::{SurfaceError, ViewError};
use crate::event::UiEvent;
use crate::id::{ViewId, anchor_under};
use crate::lifecycle::{Lifecycle, LifecycleCx, RenderState};
use crate::node::ViewNode;
use crate::surface::Surface;

/// Default liveness timeout for transient views.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(600);

/// Scheduler timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub debounce: Duration,
    pub liveness_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
        }
    }
}

/// What [`RenderScheduler::enqueue`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Added to the queue, removing `superseded` queued descendants.
    Queued { superseded: usize },
    /// Already in the queue.
    AlreadyQueued,
    /// Dropped because an ancestor is queued.
    AncestorQueued,
    /// A flush is running; re-enqueued after it.
    Deferred,
    /// No such view.
    Ignored,
}

/// A view that failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub id: ViewId,
    pub error: SurfaceError,
}

/// Outcome of one [`flush`](RenderScheduler::flush).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Views rendered, in render order (children follow their parent).
    pub rendered: Vec<ViewId>,
    /// Views whose render was vetoed by `skip_render`.
    pub skipped: Vec<ViewId>,
    pub failed: Vec<RenderFailure>,
}

impl FlushReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty() && self.skipped.is_empty() && self.failed.is_empty()
    }

    #[must_use]
    pub fn rendered(&self, id: &str) -> bool {
        self.rendered.iter().any(|r| r.as_str() == id)
    }
}

/// Events fired on the scheduler's own emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerEvent {
    Flushed,
}

// ---------------------------------------------------------------------------
// RenderScheduler
// ---------------------------------------------------------------------------

/// Owner of the view tree and its render queue.
pub struct RenderScheduler {
    store: ModelStore,
    config: SchedulerConfig,
    nodes: AHashMap<ViewId, ViewNode>,
    queue: Vec<ViewId>,
    deferred: Vec<ViewId>,
    in_flush: bool,
    flush_pending: bool,
    debouncer: Debouncer<ViewId>,
    changed: Rc<RefCell<Vec<ViewId>>>,
    events: Emitter<SchedulerEvent, FlushReport>,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(store: ModelStore, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            nodes: AHashMap::new(),
            queue: Vec::new(),
            deferred: Vec::new(),
            in_flush: false,
            flush_pending: false,
            debouncer: Debouncer::new(config.debounce),
            changed: Rc::new(RefCell::new(Vec::new())),
            events: Emitter::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    #[must_use]
    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    // -- registration -------------------------------------------------------

    /// Place `node` in the tree and write its local state to `view:<id>`.
    ///
    /// Root views fire [`Lifecycle::MustRender`] and are queued for an
    /// immediate render.
    ///
    /// # Errors
    ///
    /// - [`ViewError::DuplicateId`] when the id is taken.
    /// - [`ViewError::UnknownParent`] when the parent is not registered.
    pub fn register(&mut self, mut node: ViewNode) -> Result<(), ViewError> {
        let id = node.id.clone();
        if self.nodes.contains_key(&id) {
            return Err(ViewError::DuplicateId(id));
        }
        if let Some(parent) = &node.parent
            && !self.nodes.contains_key(parent)
        {
            return Err(ViewError::UnknownParent {
                id,
                parent: parent.clone(),
            });
        }

        let cx = LifecycleCx::new(id.clone());
        node.fire_event(&Lifecycle::MustRegister, &cx);

        let initial = std::mem::take(&mut node.state);
        self.store.create(&id.state_key(), initial, None)?;
        node.hold(self.render_on_change(&id, &id.state_key()));
        node.render_state = RenderState::Registered;
        if let Some(parent) = node.parent.clone()
            && let Some(parent) = self.nodes.get_mut(&parent)
        {
            parent.add_child(id.clone());
        }
        let root = node.is_root();
        node.fire_event(&Lifecycle::Registered, &cx);
        self.nodes.insert(id.clone(), node);
        debug!(view = %id, root, "view registered");

        if root {
            // First render of a root skips the debounce window.
            if let Some(node) = self.nodes.get(&id) {
                node.fire_event(&Lifecycle::MustRender, &cx);
            }
            self.enqueue(&id);
        }
        self.apply(cx);
        Ok(())
    }

    /// Remove `id` and its whole subtree. Returns the removed ids, subtree
    /// root first.
    pub fn unregister(&mut self, id: &ViewId) -> Vec<ViewId> {
        let Some(node) = self.nodes.get(id) else {
            warn!(view = %id, "unregister of unknown view ignored");
            return Vec::new();
        };
        if let Some(parent) = node.parent.clone()
            && let Some(parent) = self.nodes.get_mut(&parent)
        {
            parent.remove_child(id);
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            let Some(mut node) = self.nodes.remove(&next) else {
                continue;
            };
            // Requests collected from a dying view are dropped.
            node.fire_event(&Lifecycle::MustUnregister, &LifecycleCx::new(next.clone()));
            node.render_state = RenderState::Unregistered;
            stack.extend(node.children.iter().rev().cloned());

            self.store.destroy(&next.state_key());
            self.queue.retain(|q| *q != next);
            self.deferred.retain(|q| *q != next);
            self.debouncer.cancel(&next);
            removed.push(next);
        }
        debug!(view = %id, count = removed.len(), "view subtree unregistered");
        removed
    }

    /// Request a render of `id` whenever the record behind `key` changes.
    ///
    /// # Errors
    ///
    /// [`ViewError::UnknownView`] when `id` is not registered;
    /// [`ViewError::State`] for a malformed key.
    pub fn watch(&mut self, id: &ViewId, key: &str) -> Result<(), ViewError> {
        let path = Path::parse(key).map_err(StoreError::from)?;
        let subscription = self.render_on_change(id, path.name());
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ViewError::UnknownView(id.clone()))?;
        node.hold(subscription);
        Ok(())
    }

    fn render_on_change(&self, id: &ViewId, record: &str) -> Subscription {
        let changed = Rc::clone(&self.changed);
        let target = id.clone();
        self.store.subscribe(record, move |_| {
            changed.borrow_mut().push(target.clone());
        })
    }

    fn apply(&mut self, cx: LifecycleCx) {
        let (registrations, renders, unregisters) = cx.into_parts();
        for node in registrations {
            let id = node.id.clone();
            match self.register(node) {
                Ok(()) => {}
                Err(ViewError::DuplicateId(_)) => {
                    trace!(view = %id, "registration of existing view ignored");
                }
                Err(err) => error!(view = %id, %err, "lifecycle registration failed"),
            }
        }
        for id in renders {
            self.enqueue(&id);
        }
        for id in unregisters {
            self.unregister(&id);
        }
    }

    // -- requests -----------------------------------------------------------

    /// Debounced render request. Returns `false` for an unknown view.
    pub fn request_render(&mut self, id: &ViewId, now: Instant) -> bool {
        let Some(node) = self.nodes.get(id) else {
            warn!(view = %id, "render request for unknown view ignored");
            return false;
        };
        let cx = LifecycleCx::new(id.clone());
        node.fire_event(&Lifecycle::MustRender, &cx);
        self.debouncer.request(id.clone(), now);
        self.apply(cx);
        true
    }

    /// Turn state changes since the last call into debounced requests, then
    /// move requests that are due into the queue. Returns how many were
    /// moved.
    pub fn pump(&mut self, now: Instant) -> usize {
        let changed = std::mem::take(&mut *self.changed.borrow_mut());
        let mut unique: Vec<ViewId> = Vec::with_capacity(changed.len());
        for id in changed {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        for id in &unique {
            if self.nodes.contains_key(id) {
                self.request_render(id, now);
            }
        }
        let due = self.debouncer.due(now);
        for id in &due {
            self.enqueue(id);
        }
        due.len()
    }

    /// Earliest instant at which [`pump`](Self::pump) will release a request.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Whether state changes are waiting for the next `pump`.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.borrow().is_empty()
    }

    /// Queue `id` for the next flush, applying the queue rules.
    pub fn enqueue(&mut self, id: &ViewId) -> EnqueueOutcome {
        let Some(node) = self.nodes.get(id) else {
            warn!(view = %id, "enqueue of unknown view ignored");
            return EnqueueOutcome::Ignored;
        };
        let root = node.is_root();

        if self.in_flush {
            trace!(view = %id, "enqueue deferred until flush completes");
            self.deferred.push(id.clone());
            return EnqueueOutcome::Deferred;
        }
        if self.queue.is_empty() {
            self.queue.push(id.clone());
            self.flush_pending = true;
            debug!(view = %id, "enqueue: first in queue");
            return EnqueueOutcome::Queued { superseded: 0 };
        }
        if self.queue.contains(id) {
            trace!(view = %id, "enqueue: already queued");
            return EnqueueOutcome::AlreadyQueued;
        }
        let nodes = &self.nodes;
        if self.queue.iter().any(|q| is_ancestor(nodes, q, id)) {
            debug!(view = %id, "enqueue: ancestor already queued");
            return EnqueueOutcome::AncestorQueued;
        }

        let before = self.queue.len();
        self.queue.retain(|q| !is_ancestor(nodes, id, q));
        let superseded = before - self.queue.len();
        if root {
            self.queue.insert(0, id.clone());
        } else {
            self.queue.push(id.clone());
        }
        self.flush_pending = true;
        debug!(view = %id, root, superseded, "enqueue: queued");
        EnqueueOutcome::Queued { superseded }
    }

    // -- flush --------------------------------------------------------------

    /// Render every queued view against `surface`.
    ///
    /// Failures are isolated per view and reported; they never abort the
    /// flush. Requests made during the flush are re-enqueued afterwards.
    pub fn flush(&mut self, surface: &mut dyn Surface, now: Instant) -> FlushReport {
        let mut report = FlushReport::default();
        if self.in_flush {
            warn!("nested flush ignored");
            return report;
        }
        self.in_flush = true;
        self.flush_pending = false;
        let queue = std::mem::take(&mut self.queue);
        debug!(queued = queue.len(), "flush start");

        for id in &queue {
            match self.render_node(id, surface, now, &mut report) {
                Ok(()) => {}
                Err(err) => {
                    error!(view = %id, %err, "render failed; view unregistered");
                    self.unregister(id);
                    report.failed.push(RenderFailure {
                        id: id.clone(),
                        error: err,
                    });
                }
            }
        }

        self.queue.clear();
        self.in_flush = false;
        for id in std::mem::take(&mut self.deferred) {
            self.enqueue(&id);
        }
        debug!(
            rendered = report.rendered.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            requeued = self.queue.len(),
            "flush end"
        );
        self.events.fire(&SchedulerEvent::Flushed, &report);
        report
    }

    fn render_node(
        &mut self,
        id: &ViewId,
        surface: &mut dyn Surface,
        now: Instant,
        report: &mut FlushReport,
    ) -> Result<(), SurfaceError> {
        let Some(node) = self.nodes.get_mut(id) else {
            trace!(view = %id, "view removed before its render");
            return Ok(());
        };
        if node.skip_render {
            node.skip_render = false;
            debug!(view = %id, "render skipped");
            report.skipped.push(id.clone());
            return Ok(());
        }
        if !surface.resolves(&node.anchor) {
            return Err(SurfaceError::AnchorNotFound(node.anchor.clone()));
        }

        let span = debug_span!("render", view = %id);
        let _guard = span.enter();
        node.render_state = RenderState::Rendering;
        let state = self.store.get(&id.state_key()).unwrap_or(Value::Null);
        let markup = node.render_markup(&state, &self.store);
        if let Err(err) = surface.patch(&node.anchor, &markup) {
            node.render_state = RenderState::Registered;
            return Err(err);
        }
        node.render_state = RenderState::Rendered;
        node.render_count += 1;
        if node.transient {
            node.deadline = Some(now + self.config.liveness_timeout);
        }
        report.rendered.push(id.clone());

        let cx = LifecycleCx::new(id.clone());
        node.fire_event(&Lifecycle::Rendered, &cx);
        let anchor = node.anchor.clone();
        self.apply(cx);

        let children = self
            .nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child in children {
            let addressable = self
                .nodes
                .get(&child)
                .is_some_and(|c| anchor_under(&anchor, &c.anchor) && surface.resolves(&c.anchor));
            if !addressable {
                continue;
            }
            if let Err(err) = self.render_node(&child, surface, now, report) {
                error!(view = %child, %err, "child render failed; view unregistered");
                self.unregister(&child);
                report.failed.push(RenderFailure { id: child, error: err });
            }
        }
        Ok(())
    }

    // -- liveness -----------------------------------------------------------

    /// Expire transient views whose deadline has passed.
    ///
    /// An expired view whose anchor no longer resolves is unregistered; one
    /// that still resolves gets a fresh deadline. Returns the unregistered
    /// ids.
    pub fn check_liveness(&mut self, surface: &dyn Surface, now: Instant) -> Vec<ViewId> {
        let expired: Vec<ViewId> = self
            .nodes
            .values()
            .filter(|n| n.deadline.is_some_and(|at| at <= now))
            .map(|n| n.id.clone())
            .collect();

        let mut removed = Vec::new();
        for id in expired {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if surface.resolves(&node.anchor) {
                node.deadline = Some(now + self.config.liveness_timeout);
                trace!(view = %id, "liveness re-armed");
            } else {
                debug!(view = %id, "transient view expired");
                removed.extend(self.unregister(&id));
            }
        }
        removed
    }

    // -- UI events ----------------------------------------------------------

    /// Run `event` through the handlers of `id` and its ancestors until one
    /// stops propagation. Returns the number of handlers run.
    pub fn dispatch(&self, id: &ViewId, event: &UiEvent) -> usize {
        if !self.nodes.contains_key(id) {
            warn!(view = %id, event = event.name(), "dispatch to unknown view ignored");
            return 0;
        }
        let key = event.name().to_owned();
        let mut ran = 0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(current) else {
                break;
            };
            ran += node.ui.fire(&key, event);
            if event.is_stopped() {
                trace!(view = %current, event = event.name(), "propagation stopped");
                break;
            }
            cursor = node.parent.as_ref();
        }
        ran
    }

    // -- introspection ------------------------------------------------------

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ViewNode> {
        self.nodes.get(id)
    }

    /// Mutable access for flags such as
    /// [`skip_next_render`](ViewNode::skip_next_render).
    pub fn node_mut(&mut self, id: &str) -> Option<&mut ViewNode> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn render_state(&self, id: &str) -> RenderState {
        self.nodes
            .get(id)
            .map_or(RenderState::Unregistered, ViewNode::render_state)
    }

    #[must_use]
    pub fn queued(&self) -> &[ViewId] {
        &self.queue
    }

    #[must_use]
    pub fn deferred(&self) -> &[ViewId] {
        &self.deferred
    }

    #[must_use]
    pub fn flush_pending(&self) -> bool {
        self.flush_pending
    }

    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.in_flush
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ViewId> {
        let mut ids: Vec<ViewId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: &ViewId, id: &ViewId) -> bool {
        is_ancestor(&self.nodes, ancestor, id)
    }
}

impl EventEmitter for RenderScheduler {
    type Key = SchedulerEvent;
    type Payload = FlushReport;

    fn emitter(&self) -> &Emitter<SchedulerEvent, FlushReport> {
        &self.events
    }

    fn emitter_mut(&mut self) -> &mut Emitter<SchedulerEvent, FlushReport> {
        &mut self.events
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("views", &self.nodes.len())
            .field("queue", &self.queue)
            .field("deferred", &self.deferred)
            .field("in_flush", &self.in_flush)
            .field("flush_pending", &self.flush_pending)
            .finish_non_exhaustive()
    }
}

fn is_ancestor(nodes: &AHashMap<ViewId, ViewNode>, ancestor: &ViewId, id: &ViewId) -> bool {
    let mut cursor = nodes.get(id).and_then(|n| n.parent.as_ref());
    while let Some(parent) = cursor {
        if parent == ancestor {
            return true;
        }
        cursor = nodes.get(parent).and_then(|n| n.parent.as_ref());
    }
    false
}
