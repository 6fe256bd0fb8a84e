//! Cloud Firestore live queries over the REST `:runQuery` endpoint.
//!
//! SYSTEM CONTEXT
//! ==============
//! `FirestoreRest` implements the portal's `DocumentStore` without the
//! Firestore web SDK. Each live query is a local polling task that re-runs
//! the structured query every `poll_interval_ms` and pushes the full result
//! set to the listener only when it differs from the last delivery.
//!
//! DESIGN
//! ======
//! - Requests are authorized with the Session Store token, so the poll
//!   picks up token changes without re-subscribing.
//! - The listen handle owns an alive flag; dropping it stops the loop at
//!   the next tick and closes the channel.
//! - Firestore's typed value encoding is translated to and from plain JSON
//!   so reducers see the same document shape as the in-memory store.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures, non-2xx statuses, and undecodable bodies are
//! delivered as `StoreError` events; the loop keeps polling afterwards.

#[cfg(test)]
#[path = "firestore_test.rs"]
mod firestore_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use portal::channel::Subscription;
use portal::config::FirebaseConfig;
#[cfg(any(test, feature = "hydrate"))]
use portal::documents::{Document, Snapshot, SnapshotEvent};
use portal::documents::{DocumentStore, Filter, LiveQuery, LiveQueryHandle, StoreError};
use portal::session::SessionStore;
#[cfg(any(test, feature = "hydrate"))]
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Remote document store backed by Firestore's REST API.
#[derive(Clone, Debug)]
pub struct FirestoreRest {
    project_id: String,
    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    poll_interval_ms: u64,
    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    session: SessionStore,
}

impl FirestoreRest {
    pub fn new(config: &FirebaseConfig, session: SessionStore) -> Self {
        Self {
            project_id: config.project_id.clone(),
            poll_interval_ms: config.poll_interval_ms.max(250),
            session,
        }
    }
}

impl DocumentStore for FirestoreRest {
    fn listen(&self, query: &LiveQuery) -> Result<LiveQueryHandle, StoreError> {
        let request = RunQuery::new(&self.project_id, query)?;
        let alive = Arc::new(AtomicBool::new(true));
        let flag = alive.clone();
        let (sink, handle) = LiveQueryHandle::channel(Subscription::new(move || flag.store(false, Ordering::Relaxed)));
        debug!(collection = %query.collection, "firestore live query opened");

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(poll(request, self.session.clone(), self.poll_interval_ms, alive, sink));
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (request, alive, sink);
        }
        Ok(handle)
    }
}

// =============================================================================
// POLLING
// =============================================================================

#[cfg(feature = "hydrate")]
async fn poll(
    request: RunQuery,
    session: SessionStore,
    interval_ms: u64,
    alive: Arc<AtomicBool>,
    sink: portal::documents::SnapshotSink,
) {
    let mut changes = ChangeFilter::default();
    while alive.load(Ordering::Relaxed) && !sink.is_closed() {
        let event = fetch(&request, session.token().as_deref()).await;
        if !alive.load(Ordering::Relaxed) {
            break;
        }
        if changes.admit(&event) && sink.unbounded_send(event).is_err() {
            break;
        }
        gloo_timers::future::sleep(std::time::Duration::from_millis(interval_ms)).await;
    }
    debug!(url = %request.url, "firestore live query closed");
}

#[cfg(feature = "hydrate")]
async fn fetch(request: &RunQuery, token: Option<&str>) -> SnapshotEvent {
    let mut builder = gloo_net::http::Request::post(&request.url);
    if let Some(token) = token {
        builder = builder.header("Authorization", &format!("Bearer {token}"));
    }
    let resp = builder
        .json(&request.body)
        .map_err(|e| StoreError::Request(e.to_string()))?
        .send()
        .await
        .map_err(|e| StoreError::Request(e.to_string()))?;
    if !resp.ok() {
        return Err(StoreError::Rejected { status: resp.status() });
    }
    let text = resp.text().await.map_err(|e| StoreError::Decode(e.to_string()))?;
    decode_run_query(&text)
}

/// Suppresses deliveries identical to the previous one.
#[cfg(any(test, feature = "hydrate"))]
#[derive(Debug, Default)]
struct ChangeFilter {
    last: Option<SnapshotEvent>,
}

#[cfg(any(test, feature = "hydrate"))]
impl ChangeFilter {
    fn admit(&mut self, event: &SnapshotEvent) -> bool {
        if self.last.as_ref() == Some(event) {
            return false;
        }
        self.last = Some(event.clone());
        true
    }
}

// =============================================================================
// REQUEST ENCODING
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
struct RunQuery {
    url: String,
    body: Value,
}

impl RunQuery {
    fn new(project_id: &str, query: &LiveQuery) -> Result<Self, StoreError> {
        if project_id.is_empty() {
            return Err(StoreError::Listen("firebase project id is not configured".to_owned()));
        }
        let (parent, collection_id) = split_collection_path(&query.collection)?;
        Ok(Self {
            url: run_query_url(project_id, parent),
            body: structured_query(collection_id, &query.filter),
        })
    }
}

/// Split `users/u1/notifications` into parent document path and collection id.
fn split_collection_path(path: &str) -> Result<(&str, &str), StoreError> {
    let path = path.trim_matches('/');
    let segments = path.split('/').count();
    if path.is_empty() || path.split('/').any(str::is_empty) || segments % 2 == 0 {
        return Err(StoreError::Listen(format!("invalid collection path: {path}")));
    }
    Ok(path.rsplit_once('/').unwrap_or(("", path)))
}

fn run_query_url(project_id: &str, parent: &str) -> String {
    let documents = format!("{FIRESTORE_URL}/projects/{project_id}/databases/(default)/documents");
    if parent.is_empty() {
        format!("{documents}:runQuery")
    } else {
        format!("{documents}/{parent}:runQuery")
    }
}

fn structured_query(collection_id: &str, filter: &Filter) -> Value {
    let (op, field, value) = match filter {
        Filter::ArrayContains { field, value } => ("ARRAY_CONTAINS", field, value),
        Filter::Equal { field, value } => ("EQUAL", field, value),
    };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection_id }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": op,
                    "value": encode_value(value),
                }
            }
        }
    })
}

/// Plain JSON to Firestore's typed value encoding.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } }),
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), encode_value(v))).collect()
}

// =============================================================================
// RESPONSE DECODING
// =============================================================================

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[cfg(any(test, feature = "hydrate"))]
/// Firestore's typed value encoding to plain JSON. Unknown shapes decode to null.
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => match inner {
            Value::String(raw) => raw.parse::<i64>().map_or(Value::Null, Value::from),
            Value::Number(_) => inner.clone(),
            _ => Value::Null,
        },
        "doubleValue" => inner.as_f64().map_or(Value::Null, Value::from),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" | "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.clone(), decode_value(v))).collect()
}

#[cfg(any(test, feature = "hydrate"))]
/// Decode a `:runQuery` response. Items without a document (read-time only
/// markers) are skipped.
fn decode_run_query(body: &str) -> Result<Snapshot, StoreError> {
    let items: Vec<RunQueryItem> = serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    let documents = items
        .into_iter()
        .filter_map(|item| item.document)
        .map(|doc| {
            let id = doc.name.rsplit('/').next().unwrap_or_default().to_owned();
            Document::new(id, Value::Object(decode_fields(&doc.fields)))
        })
        .collect();
    Ok(Snapshot::new(documents))
}
