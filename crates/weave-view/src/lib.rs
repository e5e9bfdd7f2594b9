#![forbid(unsafe_code)]

//! View nodes and the render scheduler for Weave.
//!
//! - [`node`]: view identity, tree links, templates, handler tables.
//! - [`lifecycle`]: render states, lifecycle events, handler context.
//! - [`scheduler`]: queue, deduplication, flush, liveness, UI dispatch.
//! - [`debounce`]: render request debouncing.
//! - [`surface`]: the presentation tree abstraction.

pub mod debounce;
pub mod error;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod node;
pub mod scheduler;
pub mod surface;

pub use debounce::{DEFAULT_DEBOUNCE, Debouncer};
pub use error::{SurfaceError, ViewError};
pub use event::UiEvent;
pub use id::{STATE_PREFIX, ViewId, anchor_under};
pub use lifecycle::{Lifecycle, LifecycleCx, RenderState};
pub use node::{Template, TemplateScope, ViewNode};
pub use scheduler::{
    DEFAULT_LIVENESS_TIMEOUT, EnqueueOutcome, FlushReport, RenderFailure, RenderScheduler,
    SchedulerConfig, SchedulerEvent,
};
pub use surface::{Markup, Surface};
