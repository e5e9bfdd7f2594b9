#![forbid(unsafe_code)]

use std::fmt;

use weave_core::path::{AccessError, PathError};

/// Errors from model store operations.
///
/// All variants are caller mistakes; the store is left unchanged when one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The key could not be parsed.
    InvalidKey(PathError),
    /// A record name contained a property path where a bare name was required.
    InvalidName(String),
    /// No record with this name exists.
    UnknownRecord(String),
    /// Structural error: the property is not defined on the record value.
    UndefinedProperty { key: String },
    /// Type error: a non-container value was addressed as if it had properties.
    NotAnObject { key: String, kind: &'static str },
    /// A restore was submitted as an ordinary write.
    RestoreOrigin { key: String },
}

impl StoreError {
    pub(crate) fn access(record: &str, err: AccessError) -> Self {
        let qualify = |path: String| {
            if path.is_empty() {
                record.to_owned()
            } else {
                format!("{record}.{path}")
            }
        };
        match err {
            AccessError::UndefinedProperty { path } => Self::UndefinedProperty {
                key: qualify(path),
            },
            AccessError::NotAnObject { path, kind } => Self::NotAnObject {
                key: qualify(path),
                kind,
            },
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(err) => write!(f, "invalid key: {err}"),
            Self::InvalidName(name) => write!(f, "invalid record name '{name}'"),
            Self::UnknownRecord(name) => write!(f, "unknown record '{name}'"),
            Self::UndefinedProperty { key } => write!(f, "undefined property '{key}'"),
            Self::NotAnObject { key, kind } => {
                write!(f, "'{key}' is a {kind} value and has no properties")
            }
            Self::RestoreOrigin { key } => {
                write!(f, "write to '{key}' carries a restore origin")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidKey(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PathError> for StoreError {
    fn from(err: PathError) -> Self {
        Self::InvalidKey(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_errors_are_qualified_with_record() {
        let err = StoreError::access(
            "user",
            AccessError::UndefinedProperty {
                path: "zip".into(),
            },
        );
        assert_eq!(err.to_string(), "undefined property 'user.zip'");

        let err = StoreError::access(
            "count",
            AccessError::NotAnObject {
                path: String::new(),
                kind: "int",
            },
        );
        assert_eq!(
            err,
            StoreError::NotAnObject {
                key: "count".into(),
                kind: "int"
            }
        );
    }
}
