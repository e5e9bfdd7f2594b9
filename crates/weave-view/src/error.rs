#![forbid(unsafe_code)]

use std::fmt;

use weave_store::StoreError;

use crate::id::ViewId;

/// Errors from view registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// A view id was empty or contained `.`.
    InvalidId(String),
    /// A view with this id is already registered.
    DuplicateId(ViewId),
    /// The declared parent is not registered.
    UnknownParent { id: ViewId, parent: ViewId },
    /// No view with this id is registered.
    UnknownView(ViewId),
    /// The view's local-state record could not be written.
    State(StoreError),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "invalid view id '{id}'"),
            Self::DuplicateId(id) => write!(f, "view '{id}' is already registered"),
            Self::UnknownParent { id, parent } => {
                write!(f, "view '{id}' names unregistered parent '{parent}'")
            }
            Self::UnknownView(id) => write!(f, "unknown view '{id}'"),
            Self::State(err) => write!(f, "view state: {err}"),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::State(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ViewError {
    fn from(err: StoreError) -> Self {
        Self::State(err)
    }
}

/// Errors reported by a [`Surface`](crate::surface::Surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The anchor does not resolve to a location on the surface.
    AnchorNotFound(String),
    /// Markup declared a slot that is not below the anchor being patched.
    SlotOutsideAnchor { anchor: String, slot: String },
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnchorNotFound(anchor) => write!(f, "anchor '{anchor}' not found"),
            Self::SlotOutsideAnchor { anchor, slot } => {
                write!(f, "slot '{slot}' is not below anchor '{anchor}'")
            }
        }
    }
}

impl std::error::Error for SurfaceError {}
