#![forbid(unsafe_code)]

//! Weave: a reactive model store bound to presentation elements, with a
//! hierarchy-aware render scheduler.
//!
//! This crate re-exports the member crates under short names and gathers the
//! everyday types in [`prelude`].
//!
//! ```
//! use weave::prelude::*;
//!
//! let store = ModelStore::new();
//! store.set("form", Value::from_pairs([("title", "draft")])).unwrap();
//! store.set("form.title", "final".into()).unwrap();
//! assert!(store.undo("form"));
//! assert_eq!(store.get("form.title"), Some(Value::from("draft")));
//! ```

pub use weave_core as core;
#[cfg(feature = "runtime")]
pub use weave_runtime as runtime;
pub use weave_store as store;
pub use weave_view as view;

pub use weave_core::{ChangeEvent, ChangeOrigin, Value};
pub use weave_store::{ModelStore, StoreError};
pub use weave_view::{RenderScheduler, ViewError, ViewId, ViewNode};

#[cfg(feature = "runtime")]
pub use weave_runtime::{App, AppError, RuntimeConfig};

pub mod prelude {
    pub use weave_core::{
        ChangeEvent, ChangeOrigin, Clock, ElementId, EventEmitter, ManualClock, SystemClock,
        TopicBus, Value,
    };
    pub use weave_store::{Element, ElementRef, ModelStore, StoreError, Subscription};
    pub use weave_view::{
        FlushReport, Lifecycle, LifecycleCx, Markup, RenderScheduler, RenderState, Surface,
        SurfaceError, TemplateScope, UiEvent, ViewError, ViewId, ViewNode,
    };

    #[cfg(feature = "runtime")]
    pub use weave_runtime::{App, AppError, RuntimeConfig};
}
