#![forbid(unsafe_code)]

//! Test support for Weave.
//!
//! - [`MemorySurface`]: an in-memory presentation tree with patch logging.
//! - [`RecordingElement`] / [`InputElement`]: bound elements that remember
//!   every value pushed into them.
//! - [`Chain`]: a ready-rendered linear view tree for scheduler scenarios.

pub mod element;
pub mod fixture;
pub mod surface;

pub use element::{InputElement, RecordingElement};
pub use fixture::{Chain, labelled, view_id};
pub use surface::MemorySurface;
