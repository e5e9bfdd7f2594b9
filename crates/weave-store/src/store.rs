#![forbid(unsafe_code)]

//! The model store: the single read/write path for application and view
//! state.
//!
//! A [`ModelStore`] maps record names to [`BindableRecord`]s. Keys use dotted
//! addressing (`user.address.city`): the first segment names the record, the
//! rest address a property inside it.
//!
//! # Propagation
//!
//! Every accepted change or restore produces one notification pass:
//!
//! 1. Bound elements, in binding order, except the element that originated
//!    the change ([`ChangeEvent::skips`]).
//! 2. Record subscribers, in subscription order.
//!
//! The internal borrow is released before either step runs, so elements and
//! subscribers may read or write the store re-entrantly.
//!
//! # Invariants
//!
//! 1. `get()` returns a snapshot. Mutating it never affects the store.
//! 2. Values entering the store are snapshotted; callers keep no alias.
//! 3. Restores (`undo`, `redo`, `rewind`, `fast_forward`) never append
//!    history and notify every binding with [`ChangeOrigin::Restore`].
//! 4. Subscribers are held weakly; dropping the [`Subscription`] guard stops
//!    delivery before the next pass.
//!
//! Cloning a `ModelStore` yields another handle to the same records.
//!
//! [`ChangeOrigin::Restore`]: weave_core::origin::ChangeOrigin::Restore

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};
use weave_core::origin::{ChangeEvent, ElementId};
use weave_core::path::Path;
use weave_core::value::Value;

use crate::element::{Delivery, ElementRef};
use crate::error::StoreError;
use crate::history::{History, HistoryConfig};
use crate::record::BindableRecord;

/// Notification handed to record subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Record name.
    pub name: String,
    /// Record version after the change.
    pub version: u64,
    /// Why the change happened.
    pub event: ChangeEvent,
}

type Listener = dyn Fn(&RecordChange);

struct ListenerEntry {
    record: String,
    callback: Weak<Listener>,
}

/// RAII guard for a record subscription.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    _callback: Rc<Listener>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Work collected under the borrow, run after it is released.
struct Notice {
    deliveries: Vec<Delivery>,
    listeners: Vec<Rc<Listener>>,
    change: RecordChange,
}

impl Notice {
    fn run(self) {
        trace!(
            record = %self.change.name,
            version = self.change.version,
            origin = ?self.change.event.origin(),
            elements = self.deliveries.len(),
            subscribers = self.listeners.len(),
            "record notify"
        );
        for delivery in &self.deliveries {
            delivery.send(&self.change.event);
        }
        for listener in &self.listeners {
            listener(&self.change);
        }
    }
}

struct StoreInner {
    records: BTreeMap<String, BindableRecord>,
    listeners: Vec<ListenerEntry>,
    config: HistoryConfig,
}

impl StoreInner {
    fn notice(&mut self, name: &str, event: ChangeEvent) -> Option<Notice> {
        let record = self.records.get(name)?;
        let deliveries = record.deliveries(&event);
        let change = RecordChange {
            name: name.to_owned(),
            version: record.version(),
            event,
        };
        self.listeners.retain(|l| l.callback.strong_count() > 0);
        let listeners = self
            .listeners
            .iter()
            .filter(|l| l.record == name)
            .filter_map(|l| l.callback.upgrade())
            .collect();
        Some(Notice {
            deliveries,
            listeners,
            change,
        })
    }
}

/// Registry of bindable records.
#[derive(Clone)]
pub struct ModelStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    /// Create an empty store with the default history depth.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create an empty store whose records keep `config.max_depth` mementos.
    #[must_use]
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                records: BTreeMap::new(),
                listeners: Vec::new(),
                config,
            })),
        }
    }

    #[must_use]
    pub fn history_config(&self) -> HistoryConfig {
        self.inner.borrow().config
    }

    /// Initialize (or replace) the record `name` and optionally bind an
    /// element to it, pushing the value into the element.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidKey`] / [`StoreError::InvalidName`] when `name`
    /// is empty or contains a property path.
    pub fn create(
        &self,
        name: &str,
        value: Value,
        element: Option<ElementRef>,
    ) -> Result<(), StoreError> {
        let path = Path::parse(name)?;
        if !path.is_root() {
            return Err(StoreError::InvalidName(name.to_owned()));
        }
        let notice = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let mut record = BindableRecord::new(name, &value, inner.config);
            if let Some(element) = element {
                record.bind(element, Vec::new());
            }
            inner.records.insert(name.to_owned(), record);
            inner.notice(name, ChangeEvent::programmatic())
        };
        debug!(record = name, "record created");
        if let Some(notice) = notice {
            notice.run();
        }
        Ok(())
    }

    /// Programmatic write: [`change`](Self::change) with
    /// [`ChangeEvent::programmatic`].
    ///
    /// # Errors
    ///
    /// See [`change`](Self::change).
    pub fn set(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        self.change(key, value, ChangeEvent::programmatic())
    }

    /// Write `value` at `key`, record a memento, and notify.
    ///
    /// A whole-record write to an unknown name creates the record. Returns
    /// `Ok(false)` when the write left the value unchanged.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownRecord`] for a property write to an unknown record.
    /// - [`StoreError::UndefinedProperty`] when a map lacks the property.
    /// - [`StoreError::NotAnObject`] when a scalar is addressed as a container.
    /// - [`StoreError::RestoreOrigin`] when `event` carries
    ///   [`ChangeOrigin::Restore`](weave_core::ChangeOrigin::Restore); only
    ///   the history cursor may restore.
    pub fn change(&self, key: &str, value: Value, event: ChangeEvent) -> Result<bool, StoreError> {
        if event.is_restore() {
            return Err(StoreError::RestoreOrigin {
                key: key.to_owned(),
            });
        }
        let path = Path::parse(key)?;
        let name = path.name();
        let notice = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match inner.records.get_mut(name) {
                Some(record) => {
                    let changed = record
                        .change(path.segments(), value)
                        .map_err(|err| StoreError::access(name, err))?;
                    if !changed {
                        return Ok(false);
                    }
                }
                None if path.is_root() => {
                    let record = BindableRecord::new(name, &value, inner.config);
                    inner.records.insert(name.to_owned(), record);
                }
                None => return Err(StoreError::UnknownRecord(name.to_owned())),
            }
            inner.notice(name, event)
        };
        if let Some(notice) = notice {
            notice.run();
        }
        Ok(true)
    }

    /// Snapshot of the value at `key`, or `None` when the record or property
    /// does not exist.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = Path::parse(key).ok()?;
        let inner = self.inner.borrow();
        let record = inner.records.get(path.name())?;
        path.read(record.value()).map(Value::snapshot)
    }

    /// Bind `element` to `key` and push the current value into it.
    ///
    /// Returns `Ok(false)` if the same element is already bound at that path.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownRecord`] when the record does not exist.
    pub fn bind(&self, key: &str, element: ElementRef) -> Result<bool, StoreError> {
        let path = Path::parse(key)?;
        let id = element.id();
        let delivery = {
            let mut inner = self.inner.borrow_mut();
            let record = inner
                .records
                .get_mut(path.name())
                .ok_or_else(|| StoreError::UnknownRecord(path.name().to_owned()))?;
            if !record.bind(element, path.segments().to_vec()) {
                return Ok(false);
            }
            record.delivery_for(id, path.segments())
        };
        trace!(key, element = id.id(), "element bound");
        if let Some(delivery) = delivery {
            delivery.send(&ChangeEvent::programmatic());
        }
        Ok(true)
    }

    /// Remove every binding of `element` on record `name`.
    pub fn unbind(&self, name: &str, element: ElementId) -> usize {
        self.inner
            .borrow_mut()
            .records
            .get_mut(name)
            .map_or(0, |r| r.unbind(element))
    }

    /// Step record `name` back one memento.
    pub fn undo(&self, name: &str) -> bool {
        self.restore(name, "undo", History::undo)
    }

    /// Step record `name` forward one memento.
    pub fn redo(&self, name: &str) -> bool {
        self.restore(name, "redo", History::redo)
    }

    /// Jump record `name` to its oldest memento.
    pub fn rewind(&self, name: &str) -> bool {
        self.restore(name, "rewind", History::rewind)
    }

    /// Jump record `name` to its newest memento.
    pub fn fast_forward(&self, name: &str) -> bool {
        self.restore(name, "fast_forward", History::fast_forward)
    }

    fn restore(
        &self,
        name: &str,
        op: &'static str,
        step: impl FnOnce(&mut History<Value>) -> bool,
    ) -> bool {
        let notice = {
            let mut inner = self.inner.borrow_mut();
            let Some(record) = inner.records.get_mut(name) else {
                return false;
            };
            if !record.restore_with(step) {
                trace!(record = name, op, "history cursor clamped");
                return false;
            }
            debug!(
                record = name,
                op,
                cursor = record.history().cursor(),
                "history restore"
            );
            inner.notice(name, ChangeEvent::restore())
        };
        if let Some(notice) = notice {
            notice.run();
        }
        true
    }

    /// Drop record `name`, its bindings, and its history.
    pub fn destroy(&self, name: &str) -> bool {
        let removed = self.inner.borrow_mut().records.remove(name).is_some();
        if removed {
            debug!(record = name, "record destroyed");
        }
        removed
    }

    /// Call `callback` after every accepted change or restore of `name`.
    ///
    /// The record need not exist yet.
    pub fn subscribe(
        &self,
        name: &str,
        callback: impl Fn(&RecordChange) + 'static,
    ) -> Subscription {
        let callback: Rc<Listener> = Rc::new(callback);
        self.inner.borrow_mut().listeners.push(ListenerEntry {
            record: name.to_owned(),
            callback: Rc::downgrade(&callback),
        });
        Subscription {
            _callback: callback,
        }
    }

    /// Live subscribers on `name`.
    #[must_use]
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.inner
            .borrow()
            .listeners
            .iter()
            .filter(|l| l.record == name && l.callback.strong_count() > 0)
            .count()
    }

    /// Read a record in place.
    ///
    /// `f` must not write to the store.
    pub fn with_record<R>(&self, name: &str, f: impl FnOnce(&BindableRecord) -> R) -> Option<R> {
        self.inner.borrow().records.get(name).map(f)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().records.contains_key(name)
    }

    /// Record names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner.borrow().records.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    #[must_use]
    pub fn version(&self, name: &str) -> Option<u64> {
        self.with_record(name, BindableRecord::version)
    }

    #[must_use]
    pub fn history_len(&self, name: &str) -> Option<usize> {
        self.with_record(name, |r| r.history().len())
    }

    #[must_use]
    pub fn cursor(&self, name: &str) -> Option<usize> {
        self.with_record(name, |r| r.history().cursor())
    }

    #[must_use]
    pub fn can_undo(&self, name: &str) -> bool {
        self.with_record(name, |r| r.history().can_undo())
            .unwrap_or(false)
    }

    #[must_use]
    pub fn can_redo(&self, name: &str) -> bool {
        self.with_record(name, |r| r.history().can_redo())
            .unwrap_or(false)
    }

    #[must_use]
    pub fn binding_count(&self, name: &str) -> usize {
        self.with_record(name, |r| r.bindings().len()).unwrap_or(0)
    }
}

impl fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModelStore")
            .field("records", &inner.records.len())
            .field("listeners", &inner.listeners.len())
            .field("history_depth", &inner.config.max_depth)
            .finish()
    }
}
