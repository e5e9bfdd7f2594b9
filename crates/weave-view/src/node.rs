#![forbid(unsafe_code)]

//! View nodes: identity, tree links, template, and handler tables.

use std::fmt;

use weave_core::emitter::{Emitter, EventEmitter, HandlerId};
use weave_core::Value;
use weave_store::{ModelStore, Subscription};
use web_time::Instant;

use crate::event::UiEvent;
use crate::id::ViewId;
use crate::lifecycle::{Lifecycle, LifecycleCx, RenderState};
use crate::surface::Markup;

/// What a template sees while rendering.
pub struct TemplateScope<'a> {
    id: &'a ViewId,
    state: &'a Value,
    store: &'a ModelStore,
}

impl<'a> TemplateScope<'a> {
    pub(crate) fn new(id: &'a ViewId, state: &'a Value, store: &'a ModelStore) -> Self {
        Self { id, state, store }
    }

    #[must_use]
    pub fn id(&self) -> &ViewId {
        self.id
    }

    /// Snapshot of the view's local state.
    #[must_use]
    pub fn state(&self) -> &Value {
        self.state
    }

    /// Read any record from the model store.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    #[must_use]
    pub fn store(&self) -> &ModelStore {
        self.store
    }
}

/// Template function: local state in, markup out.
pub type Template = Box<dyn Fn(&TemplateScope<'_>) -> Markup>;

/// One node of the view tree.
///
/// Build with [`ViewNode::new`] and the `with_*` methods, then hand it to
/// [`RenderScheduler::register`](crate::RenderScheduler::register).
pub struct ViewNode {
    pub(crate) id: ViewId,
    pub(crate) parent: Option<ViewId>,
    pub(crate) children: Vec<ViewId>,
    pub(crate) anchor: String,
    pub(crate) state: Value,
    pub(crate) render_state: RenderState,
    pub(crate) skip_render: bool,
    pub(crate) transient: bool,
    pub(crate) deadline: Option<Instant>,
    pub(crate) render_count: u64,
    pub(crate) template: Template,
    lifecycle: Emitter<Lifecycle, LifecycleCx>,
    pub(crate) ui: Emitter<String, UiEvent>,
    subscriptions: Vec<Subscription>,
}

impl ViewNode {
    pub fn new(
        id: ViewId,
        anchor: impl Into<String>,
        template: impl Fn(&TemplateScope<'_>) -> Markup + 'static,
    ) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            anchor: anchor.into(),
            state: Value::Null,
            render_state: RenderState::Unregistered,
            skip_render: false,
            transient: false,
            deadline: None,
            render_count: 0,
            template: Box::new(template),
            lifecycle: Emitter::new(),
            ui: Emitter::new(),
            subscriptions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ViewId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Initial local state, written to `view:<id>` on registration.
    #[must_use]
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Give the node a liveness deadline, re-armed on every render.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Handle UI event `name` dispatched to this node or bubbled from below.
    #[must_use]
    pub fn with_handler(mut self, name: impl Into<String>, handler: impl Fn(&UiEvent) + 'static) -> Self {
        self.ui.on(name.into(), handler);
        self
    }

    /// Handle lifecycle event `event`.
    #[must_use]
    pub fn with_lifecycle(mut self, event: Lifecycle, handler: impl Fn(&LifecycleCx) + 'static) -> Self {
        self.on(event, handler);
        self
    }

    /// Keep a store subscription alive for as long as the node is registered.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Veto the next render. Cleared when it takes effect.
    pub fn skip_next_render(&mut self) {
        self.skip_render = true;
    }

    pub fn on_ui(&mut self, name: impl Into<String>, handler: impl Fn(&UiEvent) + 'static) -> HandlerId {
        self.ui.on(name.into(), handler)
    }

    #[must_use]
    pub fn id(&self) -> &ViewId {
        &self.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<&ViewId> {
        self.parent.as_ref()
    }

    #[must_use]
    pub fn children(&self) -> &[ViewId] {
        &self.children
    }

    #[must_use]
    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn add_child(&mut self, child: ViewId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: &ViewId) {
        self.children.retain(|c| c != child);
    }

    pub(crate) fn render_markup(&self, state: &Value, store: &ModelStore) -> Markup {
        (self.template)(&TemplateScope::new(&self.id, state, store))
    }
}

impl EventEmitter for ViewNode {
    type Key = Lifecycle;
    type Payload = LifecycleCx;

    fn emitter(&self) -> &Emitter<Lifecycle, LifecycleCx> {
        &self.lifecycle
    }

    fn emitter_mut(&mut self) -> &mut Emitter<Lifecycle, LifecycleCx> {
        &mut self.lifecycle
    }
}

impl fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("anchor", &self.anchor)
            .field("render_state", &self.render_state)
            .field("skip_render", &self.skip_render)
            .field("transient", &self.transient)
            .field("render_count", &self.render_count)
            .finish_non_exhaustive()
    }
}
