//! Durable key-value storage behind the roster and score bundle.
//!
//! The browser build talks to `window.localStorage`; tests and the in-memory
//! fallback use [`MemoryStore`]. Values are always JSON strings.

use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No storage backend could be obtained (private mode, non-browser target).
    Unavailable(String),
    /// Reading a key failed.
    Read { key: String, reason: String },
    /// Writing or removing a key failed, e.g. quota exceeded.
    Write { key: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "Storage unavailable: {}", reason),
            StoreError::Read { key, reason } => {
                write!(f, "Could not read '{}' from storage: {}", key, reason)
            }
            StoreError::Write { key, reason } => {
                write!(f, "Could not write '{}' to storage: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Minimal string-keyed persistence used by the roster and the ledger.
///
/// Methods take `&self`: the app is single-threaded and every backend
/// (localStorage, `RefCell` map) already has interior mutability.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// `window.localStorage` backed store.
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Open the page's local storage.
    pub fn open() -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window object".to_string()))?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StoreError::Unavailable(
                "localStorage is disabled".to_string(),
            )),
            Err(e) => Err(StoreError::Unavailable(format!("{:?}", e))),
        }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: format!("{:?}", e),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(|e| StoreError::Write {
            key: key.to_string(),
            reason: format!("{:?}", e),
        })
    }
}

/// In-memory store. Used in tests and as the session fallback when the
/// browser refuses to hand out localStorage.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, mimicking a full quota.
    pub fn read_only() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            read_only: true,
        }
    }

    /// Pre-seed a raw value, bypassing the read-only flag.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Read a key, folding backend errors into "absent".
///
/// Readers of persisted state never fail; a broken store looks like a fresh one.
pub fn read_or_none(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Parse a stored JSON document, treating malformed text as absent.
pub fn read_json(store: &dyn KeyValueStore, key: &str) -> Option<serde_json::Value> {
    let raw = read_or_none(store, key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring malformed data under '{}': {}", key, e);
            None
        }
    }
}
