#![forbid(unsafe_code)]

//! Dotted record addressing.
//!
//! A key such as `user.address.city` names the record `user` and the
//! property path `address.city` inside its value. Paths never name a second
//! record: everything after the first dot is resolved within one value.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Error |
//! |---------|-------|-------|
//! | Empty key | `""` | [`PathError::Empty`] |
//! | Empty segment | `"a..b"`, `"a."`, `".a"` | [`PathError::EmptySegment`] |
//! | Missing property on write | map lacks the key, list index out of range | [`AccessError::UndefinedProperty`] |
//! | Property of a scalar | `"count.x"` where `count` is an int | [`AccessError::NotAnObject`] |

use std::fmt;

use crate::value::Value;

/// Errors from parsing a dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The key was empty.
    Empty,
    /// The key contained an empty segment.
    EmptySegment(String),
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty record key"),
            Self::EmptySegment(key) => write!(f, "empty path segment in '{key}'"),
        }
    }
}

impl std::error::Error for PathError {}

/// Errors from addressing a property inside a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The property does not exist on the map (or the list index is out of range).
    UndefinedProperty { path: String },
    /// The value at `path` is not a map or list.
    NotAnObject { path: String, kind: &'static str },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedProperty { path } => write!(f, "undefined property '{path}'"),
            Self::NotAnObject { path, kind } => {
                write!(f, "cannot address properties of {kind} value at '{path}'")
            }
        }
    }
}

impl std::error::Error for AccessError {}

/// A parsed record key: record name plus property segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    record: String,
    segments: Vec<String>,
}

impl Path {
    /// Parse a dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] for empty keys or empty segments.
    pub fn parse(key: &str) -> Result<Self, PathError> {
        if key.is_empty() {
            return Err(PathError::Empty);
        }
        let mut parts = key.split('.');
        let record = parts.next().unwrap_or_default();
        let segments: Vec<String> = parts.map(str::to_owned).collect();
        if record.is_empty() || segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment(key.to_owned()));
        }
        Ok(Self {
            record: record.to_owned(),
            segments,
        })
    }

    /// Path addressing a whole record.
    #[must_use]
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            record: name.into(),
            segments: Vec::new(),
        }
    }

    /// Append a property segment.
    #[must_use]
    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// The record name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record
    }

    /// Property segments after the record name.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether the path addresses the whole record.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Read the addressed property of `value`.
    #[must_use]
    pub fn read<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        read_at(value, &self.segments)
    }

    /// Replace the addressed property of `value` with `new`.
    ///
    /// Intermediate and final properties must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] when a property is missing or a scalar is
    /// addressed as a container.
    pub fn write(&self, value: &mut Value, new: Value) -> Result<(), AccessError> {
        write_at(value, &self.segments, new)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record)?;
        for seg in &self.segments {
            write!(f, ".{seg}")?;
        }
        Ok(())
    }
}

/// Read a property path relative to `value`.
#[must_use]
pub fn read_at<'v>(value: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments
        .iter()
        .try_fold(value, |current, seg| current.property(seg))
}

/// Write a property path relative to `value`.
///
/// # Errors
///
/// See [`Path::write`].
pub fn write_at(value: &mut Value, segments: &[String], new: Value) -> Result<(), AccessError> {
    let mut current = value;
    for (depth, seg) in segments.iter().enumerate() {
        let here = || segments[..=depth].join(".");
        current = match current {
            Value::Map(map) => map
                .get_mut(seg.as_str())
                .ok_or_else(|| AccessError::UndefinedProperty { path: here() })?,
            Value::List(items) => seg
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| AccessError::UndefinedProperty { path: here() })?,
            other => {
                return Err(AccessError::NotAnObject {
                    path: segments[..depth].join("."),
                    kind: other.kind(),
                });
            }
        };
    }
    *current = new;
    Ok(())
}
