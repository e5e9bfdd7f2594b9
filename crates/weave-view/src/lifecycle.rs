#![forbid(unsafe_code)]

//! View lifecycle states and the context handed to lifecycle handlers.
//!
//! ```text
//!  Unregistered ──register──▶ Registered ──render──▶ Rendering ──▶ Rendered
//!        ▲                                              ▲              │
//!        └──────────────── unregister ◀─────────────────┴── render ◀──┘
//! ```

use std::cell::RefCell;

use crate::id::ViewId;
use crate::node::ViewNode;

/// Where a view is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderState {
    Unregistered,
    Registered,
    Rendering,
    Rendered,
}

/// Lifecycle events fired on a view's [`EventEmitter`].
///
/// [`EventEmitter`]: weave_core::EventEmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    MustRegister,
    Registered,
    MustRender,
    Rendered,
    MustUnregister,
}

/// Requests collected from lifecycle handlers.
///
/// Handlers cannot reach the scheduler directly. What they ask for here is
/// applied once they return, through the same reentrancy guard as any other
/// request, so renders asked for mid-flush run after the flush.
#[derive(Debug)]
pub struct LifecycleCx {
    id: ViewId,
    registrations: RefCell<Vec<ViewNode>>,
    renders: RefCell<Vec<ViewId>>,
    unregisters: RefCell<Vec<ViewId>>,
}

impl LifecycleCx {
    pub(crate) fn new(id: ViewId) -> Self {
        Self {
            id,
            registrations: RefCell::new(Vec::new()),
            renders: RefCell::new(Vec::new()),
            unregisters: RefCell::new(Vec::new()),
        }
    }

    /// The view whose lifecycle event is firing.
    #[must_use]
    pub fn id(&self) -> &ViewId {
        &self.id
    }

    /// Register a view. An id that is already registered is left alone.
    pub fn register(&self, node: ViewNode) {
        self.registrations.borrow_mut().push(node);
    }

    /// Ask for `id` to render. Goes straight to the scheduler queue.
    pub fn request_render(&self, id: ViewId) {
        self.renders.borrow_mut().push(id);
    }

    pub fn unregister(&self, id: ViewId) {
        self.unregisters.borrow_mut().push(id);
    }

    pub(crate) fn into_parts(self) -> (Vec<ViewNode>, Vec<ViewId>, Vec<ViewId>) {
        (
            self.registrations.into_inner(),
            self.renders.into_inner(),
            self.unregisters.into_inner(),
        )
    }
}
