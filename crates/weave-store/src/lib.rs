#![forbid(unsafe_code)]

//! Reactive, versioned model store for Weave.
//!
//! Records are named [`Value`](weave_core::Value)s. Elements bind to a record
//! (or a sub-property of one) and are pushed every accepted change. Each
//! record keeps a bounded [`History`] of mementos that `undo`, `redo`,
//! `rewind`, and `fast_forward` walk without appending.

pub mod element;
pub mod error;
pub mod history;
pub mod record;
pub mod store;

pub use element::{Binding, Element, ElementRef};
pub use error::StoreError;
pub use history::{DEFAULT_HISTORY_DEPTH, History, HistoryConfig};
pub use record::BindableRecord;
pub use store::{ModelStore, RecordChange, Subscription};
