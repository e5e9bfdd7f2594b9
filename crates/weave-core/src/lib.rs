#![forbid(unsafe_code)]

//! Core types for Weave.
//!
//! - [`value`]: structured values and callback-free snapshots.
//! - [`path`]: dotted record addressing.
//! - [`origin`]: change events and element identity.
//! - [`emitter`]: the `on` / `off` / `fire_event` capability.
//! - [`bus`]: synchronous topic bus.
//! - [`clock`]: monotonic time sources.
//! - [`query`]: sort and filter helpers.

pub mod bus;
pub mod clock;
pub mod emitter;
pub mod origin;
pub mod path;
pub mod query;
pub mod value;

pub use bus::{TopicBus, TopicHandle};
pub use clock::{Clock, Instant, ManualClock, SystemClock};
pub use emitter::{Emitter, EventEmitter, Handler, HandlerId};
pub use origin::{ChangeEvent, ChangeOrigin, ElementId};
pub use path::{AccessError, Path, PathError};
pub use query::{QueryError, SortKey, SortOrder, filter_by, sort_by};
pub use value::{Callback, Map, Value};
