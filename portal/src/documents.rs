//! Document-store boundary: collection paths, filters and live queries.
//!
//! SYSTEM CONTEXT
//! ==============
//! A live query re-delivers the whole matching result set whenever it
//! changes; there are no deltas. Listening returns a `LiveQueryHandle` that
//! owns both the snapshot channel and the backend subscription, so dropping
//! the handle is the only way to stop listening.
//!
//! `MemoryDocumentStore` evaluates filters locally and pushes a snapshot to
//! each matching listener on every write. The client's `FirestoreRest`
//! provides the remote implementation.

#[cfg(test)]
#[path = "documents_test.rs"]
mod documents_test;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use futures::StreamExt;
use futures::channel::mpsc;
use serde_json::Value;
use tracing::debug;

use crate::channel::Subscription;

/// One stored document.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Value) -> Self {
        Self { id: id.into(), fields }
    }

    /// Top-level field lookup.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Full result set of a live query at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    #[must_use]
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Single-field predicate supported by the portal's queries.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// Array field contains `value`.
    ArrayContains { field: String, value: Value },
    /// Field equals `value`.
    Equal { field: String, value: Value },
}

impl Filter {
    pub fn array_contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::ArrayContains { field: field.into(), value: value.into() }
    }

    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::ArrayContains { field, .. } | Self::Equal { field, .. } => field,
        }
    }

    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::ArrayContains { field, value } => document
                .field(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Self::Equal { field, value } => document.field(field) == Some(value),
        }
    }
}

/// Collection path plus filter.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveQuery {
    pub collection: String,
    pub filter: Filter,
}

impl LiveQuery {
    pub fn new(collection: impl Into<String>, filter: Filter) -> Self {
        Self { collection: collection.into(), filter }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The listener could not be registered.
    #[error("listen failed: {0}")]
    Listen(String),

    /// The query request could not be sent.
    #[error("query request failed: {0}")]
    Request(String),

    /// The store answered with a non-success status.
    #[error("query rejected: status {status}")]
    Rejected { status: u16 },

    /// The response body could not be decoded.
    #[error("query response decode failed: {0}")]
    Decode(String),
}

pub type SnapshotEvent = Result<Snapshot, StoreError>;

/// Sender half handed to store implementations.
pub type SnapshotSink = mpsc::UnboundedSender<SnapshotEvent>;

/// An open live query. Dropping it closes the backend subscription.
#[derive(Debug)]
pub struct LiveQueryHandle {
    events: mpsc::UnboundedReceiver<SnapshotEvent>,
    _subscription: Subscription,
}

impl LiveQueryHandle {
    /// Create a sink/handle pair; `subscription` is released with the handle.
    #[must_use]
    pub fn channel(subscription: Subscription) -> (SnapshotSink, Self) {
        let (tx, rx) = mpsc::unbounded();
        (tx, Self { events: rx, _subscription: subscription })
    }

    /// Next snapshot or query error. `None` once the store stops delivering.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.events.next().await
    }
}

/// External document database offering live queries.
pub trait DocumentStore: Send + Sync {
    /// Start listening to `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be registered.
    fn listen(&self, query: &LiveQuery) -> Result<LiveQueryHandle, StoreError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Local document store with live-query fan-out.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: HashMap<String, BTreeMap<String, Value>>,
    listeners: BTreeMap<u64, Listener>,
    next_listener_id: u64,
}

#[derive(Debug)]
struct Listener {
    query: LiveQuery,
    sink: SnapshotSink,
}

impl MemoryInner {
    fn snapshot(&self, query: &LiveQuery) -> Snapshot {
        let documents = self
            .collections
            .get(&query.collection)
            .into_iter()
            .flatten()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|doc| query.filter.matches(doc))
            .collect();
        Snapshot::new(documents)
    }

    fn notify(&mut self, collection: &str) {
        let mut closed = Vec::new();
        for (id, listener) in &self.listeners {
            if listener.query.collection != collection {
                continue;
            }
            let snapshot = self.snapshot(&listener.query);
            if listener.sink.unbounded_send(Ok(snapshot)).is_err() {
                closed.push(*id);
            }
        }
        for id in closed {
            self.listeners.remove(&id);
        }
    }
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace a document and notify listeners of its collection.
    pub fn upsert(&self, collection: &str, id: &str, fields: Value) {
        let mut inner = self.lock();
        inner
            .collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), fields);
        inner.notify(collection);
    }

    /// Delete a document and notify listeners of its collection.
    pub fn delete(&self, collection: &str, id: &str) {
        let mut inner = self.lock();
        let removed = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .is_some();
        if removed {
            inner.notify(collection);
        }
    }

    /// Deliver `error` to every listener of `collection`.
    pub fn fail(&self, collection: &str, error: &StoreError) {
        let inner = self.lock();
        for listener in inner.listeners.values() {
            if listener.query.collection == collection {
                let _ = listener.sink.unbounded_send(Err(error.clone()));
            }
        }
    }

    /// Number of open live queries.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn listen(&self, query: &LiveQuery) -> Result<LiveQueryHandle, StoreError> {
        let mut inner = self.lock();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;

        let registry = Arc::clone(&self.inner);
        let (sink, handle) = LiveQueryHandle::channel(Subscription::new(move || {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&id);
        }));

        let initial = inner.snapshot(query);
        let _ = sink.unbounded_send(Ok(initial));
        inner.listeners.insert(id, Listener { query: query.clone(), sink });
        debug!(listener = id, collection = %query.collection, "memory live query opened");
        Ok(handle)
    }
}
