#![forbid(unsafe_code)]

//! An in-memory presentation tree.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use weave_store::ElementRef;
use weave_view::{Markup, Surface, SurfaceError, anchor_under};

#[derive(Default)]
struct Tree {
    content: BTreeMap<String, String>,
    elements: BTreeMap<String, ElementRef>,
    patches: Vec<String>,
}

/// [`Surface`] held in memory. Clones share the same tree, so a test can keep
/// a handle while an [`App`](weave_runtime::App) owns another.
///
/// Patching an anchor drops every anchor below it and creates the markup's
/// slots empty. Elements are attached to anchors and only resolve while their
/// anchor does.
#[derive(Clone, Default)]
pub struct MemorySurface {
    tree: Rc<RefCell<Tree>>,
}

impl MemorySurface {
    /// A surface whose only anchors are `roots`.
    #[must_use]
    pub fn with_roots<'a>(roots: impl IntoIterator<Item = &'a str>) -> Self {
        let surface = Self::default();
        {
            let mut tree = surface.tree.borrow_mut();
            for root in roots {
                tree.content.insert(root.to_owned(), String::new());
            }
        }
        surface
    }

    /// Attach `element` to `anchor`, replacing any element already there.
    pub fn attach(&self, anchor: impl Into<String>, element: ElementRef) {
        self.tree.borrow_mut().elements.insert(anchor.into(), element);
    }

    /// Remove `anchor` and everything below it, as a host would when it
    /// tears down part of the tree on its own.
    pub fn remove(&self, anchor: &str) -> usize {
        let mut tree = self.tree.borrow_mut();
        let before = tree.content.len();
        tree.content
            .retain(|k, _| k != anchor && !anchor_under(anchor, k));
        before - tree.content.len()
    }

    /// Last content patched into `anchor`; `None` when it does not resolve.
    #[must_use]
    pub fn text(&self, anchor: &str) -> Option<String> {
        self.tree.borrow().content.get(anchor).cloned()
    }

    /// Every anchor that currently resolves, in order.
    #[must_use]
    pub fn anchors(&self) -> Vec<String> {
        self.tree.borrow().content.keys().cloned().collect()
    }

    /// Every anchor patched so far, in patch order.
    #[must_use]
    pub fn patches(&self) -> Vec<String> {
        self.tree.borrow().patches.clone()
    }

    #[must_use]
    pub fn patch_count(&self, anchor: &str) -> usize {
        self.tree
            .borrow()
            .patches
            .iter()
            .filter(|a| *a == anchor)
            .count()
    }

    pub fn clear_patches(&self) {
        self.tree.borrow_mut().patches.clear();
    }
}

impl Surface for MemorySurface {
    fn resolves(&self, anchor: &str) -> bool {
        self.tree.borrow().content.contains_key(anchor)
    }

    fn patch(&mut self, anchor: &str, markup: &Markup) -> Result<(), SurfaceError> {
        let mut tree = self.tree.borrow_mut();
        if !tree.content.contains_key(anchor) {
            return Err(SurfaceError::AnchorNotFound(anchor.to_owned()));
        }
        if let Some(slot) = markup.slots().iter().find(|s| !anchor_under(anchor, s)) {
            return Err(SurfaceError::SlotOutsideAnchor {
                anchor: anchor.to_owned(),
                slot: slot.clone(),
            });
        }

        tree.content.retain(|k, _| !anchor_under(anchor, k));
        tree.content
            .insert(anchor.to_owned(), markup.content().to_owned());
        for slot in markup.slots() {
            tree.content.insert(slot.clone(), String::new());
        }
        tree.patches.push(anchor.to_owned());
        trace!(anchor, slots = markup.slots().len(), "surface patched");
        Ok(())
    }

    fn element(&self, anchor: &str) -> Option<ElementRef> {
        let tree = self.tree.borrow();
        if !tree.content.contains_key(anchor) {
            return None;
        }
        tree.elements.get(anchor).cloned()
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("MemorySurface")
            .field("anchors", &tree.content.keys().collect::<Vec<_>>())
            .field("elements", &tree.elements.keys().collect::<Vec<_>>())
            .field("patches", &tree.patches.len())
            .finish()
    }
}
