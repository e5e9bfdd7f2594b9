#![forbid(unsafe_code)]

use std::borrow::Borrow;
use std::fmt;

use crate::error::ViewError;

/// Prefix of the model-store record holding a view's local state.
pub const STATE_PREFIX: &str = "view:";

/// Identity of a view node: a non-empty string without `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(String);

impl ViewId {
    /// # Errors
    ///
    /// [`ViewError::InvalidId`] when `id` is empty or contains `.`.
    pub fn new(id: impl Into<String>) -> Result<Self, ViewError> {
        let id = id.into();
        if id.is_empty() || id.contains('.') {
            return Err(ViewError::InvalidId(id));
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the record holding this view's local state.
    #[must_use]
    pub fn state_key(&self) -> String {
        format!("{STATE_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ViewId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ViewId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ViewId {
    type Error = ViewError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

/// Whether `child` is addressable below `parent`: it starts with the parent
/// anchor followed by `/`.
#[must_use]
pub fn anchor_under(parent: &str, child: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}
