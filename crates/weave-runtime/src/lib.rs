#![forbid(unsafe_code)]

//! Application runtime for Weave.
//!
//! [`App`] is the explicit context that owns a model store, a render
//! scheduler, a topic bus, a surface, and a clock, and drives them from
//! host ticks. The remaining modules cover what sits around it:
//! configuration, subscriber setup, collaborator contracts, and session
//! mirroring.

pub mod app;
pub mod collab;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use app::App;
pub use collab::{
    AuthEvent, DataProvider, EntityCache, MemoryCache, Remote, Route, RouteTable, Router,
    TransportError, load_into,
};
pub use config::{ConfigError, RuntimeConfig};
pub use error::AppError;
pub use session::{MemoryStorage, SessionMirror, SessionStorage};
