//! Synchronous key-value storage boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! Mirrors the browser `Storage` API (`localStorage`, `sessionStorage`):
//! string keys, string values, no transactions. The client crate provides
//! the `web-sys` implementations; this module provides the in-memory and
//! no-op ones used by tests and server rendering.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Per-key atomic string storage. Concurrent writers are not coordinated;
/// the last write to a key wins.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Remove `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
}

/// Process-local storage backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
    }
}

/// Storage for environments without persistence (server rendering).
/// Reads return `None`; writes are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStorage;

impl KeyValueStorage for NoopStorage {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}

    fn remove(&self, _key: &str) {}
}
