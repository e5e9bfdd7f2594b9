#![forbid(unsafe_code)]

use std::fmt;

use weave_core::PathError;
use weave_store::StoreError;
use weave_view::{SurfaceError, ViewError};

use crate::collab::TransportError;

/// Errors surfaced by [`App`](crate::App) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Store(StoreError),
    View(ViewError),
    Surface(SurfaceError),
    Transport(TransportError),
    /// No element lives at this surface anchor.
    NoElement(String),
    /// The router has no route for this path.
    NoRoute(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store: {err}"),
            Self::View(err) => write!(f, "view: {err}"),
            Self::Surface(err) => write!(f, "surface: {err}"),
            Self::Transport(err) => write!(f, "transport: {err}"),
            Self::NoElement(anchor) => write!(f, "no element at anchor '{anchor}'"),
            Self::NoRoute(path) => write!(f, "no route for '{path}'"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::View(err) => Some(err),
            Self::Surface(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::NoElement(_) | Self::NoRoute(_) => None,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<PathError> for AppError {
    fn from(err: PathError) -> Self {
        Self::Store(StoreError::from(err))
    }
}

impl From<ViewError> for AppError {
    fn from(err: ViewError) -> Self {
        Self::View(err)
    }
}

impl From<SurfaceError> for AppError {
    fn from(err: SurfaceError) -> Self {
        Self::Surface(err)
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}
