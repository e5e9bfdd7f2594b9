#![forbid(unsafe_code)]

//! The presentation tree, seen from the scheduler.
//!
//! A surface is addressed by slash-separated anchors (`app/sidebar/list`).
//! Patching an anchor replaces everything below it: descendant anchors from
//! the previous render stop resolving and the new markup's slots start to.

use weave_store::ElementRef;

use crate::error::SurfaceError;

/// Output of a view template: content for the anchor plus the child anchors
/// it creates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup {
    content: String,
    slots: Vec<String>,
}

impl Markup {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            slots: Vec::new(),
        }
    }

    /// Declare a child anchor created by this markup. Slots are full anchors.
    #[must_use]
    pub fn with_slot(mut self, anchor: impl Into<String>) -> Self {
        self.slots.push(anchor.into());
        self
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn slots(&self) -> &[String] {
        &self.slots
    }
}

/// A host presentation tree.
pub trait Surface {
    /// Whether `anchor` currently resolves.
    fn resolves(&self, anchor: &str) -> bool;

    /// Replace the content below `anchor` with `markup`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::AnchorNotFound`] when the anchor does not resolve;
    /// [`SurfaceError::SlotOutsideAnchor`] when a slot is not below it.
    fn patch(&mut self, anchor: &str, markup: &Markup) -> Result<(), SurfaceError>;

    /// The bindable element living at `anchor`, if any.
    fn element(&self, anchor: &str) -> Option<ElementRef>;
}

impl<S: Surface + ?Sized> Surface for Box<S> {
    fn resolves(&self, anchor: &str) -> bool {
        (**self).resolves(anchor)
    }

    fn patch(&mut self, anchor: &str, markup: &Markup) -> Result<(), SurfaceError> {
        (**self).patch(anchor, markup)
    }

    fn element(&self, anchor: &str) -> Option<ElementRef> {
        (**self).element(anchor)
    }
}
