#![forbid(unsafe_code)]

//! Mirror of session records into host storage.
//!
//! The mirror writes each watched record as a JSON string under the record's
//! name. Storage is a cache, not a source of truth: entries that fail to
//! parse are dropped on [`seed`](SessionMirror::seed), and the store always
//! wins on conflict.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};
use weave_core::Value;
use weave_store::{ModelStore, Subscription};

/// Host key/value storage for strings.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// [`SessionStorage`] kept in memory. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.borrow_mut().insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

type SharedStorage = Rc<RefCell<dyn SessionStorage>>;

/// Keeps storage in step with a set of records.
pub struct SessionMirror {
    keys: Vec<String>,
    storage: SharedStorage,
    _subscriptions: Vec<Subscription>,
}

impl SessionMirror {
    /// Start mirroring `keys` from `store` into `storage`.
    pub fn attach(
        store: &ModelStore,
        storage: impl SessionStorage + 'static,
        keys: &[String],
    ) -> Self {
        let storage: SharedStorage = Rc::new(RefCell::new(storage));
        let subscriptions = keys
            .iter()
            .map(|key| {
                let source = store.clone();
                let storage = Rc::clone(&storage);
                let name = key.clone();
                store.subscribe(key, move |_| {
                    write_through(&source, &mut *storage.borrow_mut(), &name);
                })
            })
            .collect();
        Self {
            keys: keys.to_vec(),
            storage,
            _subscriptions: subscriptions,
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Create each watched record that is absent from `store` but present in
    /// storage. Returns how many records were seeded.
    pub fn seed(&self, store: &ModelStore) -> usize {
        let mut seeded = 0;
        for key in &self.keys {
            if store.contains(key) {
                continue;
            }
            let Some(raw) = self.storage.borrow().get(key) else {
                continue;
            };
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(json) => match store.create(key, Value::from(json), None) {
                    Ok(()) => seeded += 1,
                    Err(err) => warn!(key, %err, "session seed rejected"),
                },
                Err(err) => {
                    warn!(key, %err, "dropping unreadable session entry");
                    self.storage.borrow_mut().remove(key);
                }
            }
        }
        debug!(seeded, "session seeded");
        seeded
    }

    /// Write every watched record to storage now.
    pub fn sync(&self, store: &ModelStore) {
        let mut storage = self.storage.borrow_mut();
        for key in &self.keys {
            write_through(store, &mut *storage, key);
        }
    }

    /// Drop the watched records from `store` and from storage.
    pub fn forget(&self, store: &ModelStore) {
        let mut storage = self.storage.borrow_mut();
        for key in &self.keys {
            store.destroy(key);
            storage.remove(key);
        }
        debug!("session forgotten");
    }
}

impl fmt::Debug for SessionMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionMirror")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

fn write_through(store: &ModelStore, storage: &mut dyn SessionStorage, key: &str) {
    match store.get(key) {
        Some(value) if !value.is_null() => match serde_json::to_string(&value.to_json()) {
            Ok(raw) => storage.set(key, raw),
            Err(err) => warn!(key, %err, "session value not serializable"),
        },
        _ => storage.remove(key),
    }
}
