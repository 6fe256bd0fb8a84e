//! Unread-count aggregators for chat and notifications.
//!
//! DESIGN
//! ======
//! An aggregator follows the auth publisher. While a user is signed in it
//! holds exactly one live query scoped to that user and reduces every
//! snapshot to a single count; the whole result set is re-reduced each
//! time. When the uid changes the old query is dropped before the new one
//! is opened. Signed out (or still loading) means no query and a zero count.
//!
//! ERROR HANDLING
//! ==============
//! Query errors are logged and surfaced in `UnreadAggregate::error`; the last
//! good count is kept.

#[cfg(test)]
#[path = "unread_test.rs"]
mod unread_test;

use std::pin::pin;
use std::sync::Arc;

use futures::future::{self, Either};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::AuthContextState;
use crate::channel::{StatePublisher, StateSubscriber};
use crate::documents::{DocumentStore, Filter, LiveQuery, LiveQueryHandle, Snapshot, SnapshotEvent};

pub const DEFAULT_CHAT_COLLECTION: &str = "chats";
pub const DEFAULT_NOTIFICATIONS_COLLECTION: &str = "users/{uid}/notifications";

/// Published per-feature unread state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnreadAggregate {
    pub count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl UnreadAggregate {
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending() -> Self {
        Self { count: 0, loading: true, error: None }
    }

    #[must_use]
    pub fn ready(count: u64) -> Self {
        Self { count, loading: false, error: None }
    }
}

/// Per-feature query construction and snapshot reduction.
pub trait UnreadReducer: Send + Sync {
    /// Short feature name used in logs.
    fn feature(&self) -> &'static str;

    /// Live query scoped to `uid`.
    fn query(&self, uid: &str) -> LiveQuery;

    /// Reduce a full snapshot to the unread count for `uid`.
    fn reduce(&self, uid: &str, snapshot: &Snapshot) -> u64;
}

/// Chat threads where `participants` contains the user; the count is the sum
/// of `unreadCount[uid]` across threads.
#[derive(Clone, Debug)]
pub struct ChatUnread {
    collection: String,
}

impl ChatUnread {
    pub fn new(collection: impl Into<String>) -> Self {
        Self { collection: collection.into() }
    }
}

impl Default for ChatUnread {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_COLLECTION)
    }
}

impl UnreadReducer for ChatUnread {
    fn feature(&self) -> &'static str {
        "chat"
    }

    fn query(&self, uid: &str) -> LiveQuery {
        LiveQuery::new(self.collection.clone(), Filter::array_contains("participants", uid))
    }

    fn reduce(&self, uid: &str, snapshot: &Snapshot) -> u64 {
        snapshot
            .documents
            .iter()
            .map(|doc| {
                doc.field("unreadCount")
                    .and_then(|counts| counts.get(uid))
                    .map_or(0, unread_value)
            })
            .fold(0, u64::saturating_add)
    }
}

/// Per-user unread field value; anything but a non-negative number is zero.
fn unread_value(value: &Value) -> u64 {
    if let Some(n) = value.as_u64() {
        return n;
    }
    match value.as_f64() {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(f) if f.is_finite() && f > 0.0 => f as u64,
        _ => 0,
    }
}

/// Notifications under the user's own collection with `isRead == false`;
/// the count is the number of matching documents.
#[derive(Clone, Debug)]
pub struct NotificationUnread {
    collection_template: String,
}

impl NotificationUnread {
    /// `collection_template` may contain `{uid}`.
    pub fn new(collection_template: impl Into<String>) -> Self {
        Self { collection_template: collection_template.into() }
    }
}

impl Default for NotificationUnread {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATIONS_COLLECTION)
    }
}

impl UnreadReducer for NotificationUnread {
    fn feature(&self) -> &'static str {
        "notifications"
    }

    fn query(&self, uid: &str) -> LiveQuery {
        LiveQuery::new(self.collection_template.replace("{uid}", uid), Filter::equal("isRead", false))
    }

    fn reduce(&self, _uid: &str, snapshot: &Snapshot) -> u64 {
        snapshot.len() as u64
    }
}

// =============================================================================
// AGGREGATOR
// =============================================================================

struct Binding {
    uid: String,
    handle: LiveQueryHandle,
}

enum Step {
    Auth(Option<AuthContextState>),
    Snapshot(Option<SnapshotEvent>),
}

/// Reduces one user-scoped live query to a published unread count.
pub struct UnreadAggregator<R> {
    reducer: R,
    store: Arc<dyn DocumentStore>,
    publisher: StatePublisher<UnreadAggregate>,
}

impl<R: UnreadReducer> UnreadAggregator<R> {
    pub fn new(reducer: R, store: Arc<dyn DocumentStore>) -> Self {
        Self { reducer, store, publisher: StatePublisher::new(UnreadAggregate::pending()) }
    }

    #[must_use]
    pub fn subscribe(&self) -> StateSubscriber<UnreadAggregate> {
        self.publisher.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> UnreadAggregate {
        self.publisher.current()
    }

    /// Follow `auth` until its publisher goes away.
    ///
    /// The live query is owned by this future: dropping it (unmount) closes
    /// the query, as does sign-out.
    pub async fn run(&self, mut auth: StateSubscriber<AuthContextState>) {
        let mut binding: Option<Binding> = None;
        self.rebind(&auth.current(), &mut binding);

        loop {
            let step = match binding.as_mut() {
                None => Step::Auth(auth.changed().await),
                Some(active) => {
                    let auth_changed = pin!(auth.changed());
                    let next_event = pin!(active.handle.next());
                    match future::select(auth_changed, next_event).await {
                        Either::Left((state, _)) => Step::Auth(state),
                        Either::Right((event, _)) => Step::Snapshot(event),
                    }
                }
            };

            match step {
                Step::Auth(Some(state)) => self.rebind(&state, &mut binding),
                Step::Auth(None) => break,
                Step::Snapshot(Some(Ok(snapshot))) => {
                    if let Some(active) = &binding {
                        let count = self.reducer.reduce(&active.uid, &snapshot);
                        debug!(feature = self.reducer.feature(), count, "unread count updated");
                        self.publisher.publish_if_changed(UnreadAggregate::ready(count));
                    }
                }
                Step::Snapshot(Some(Err(e))) => {
                    warn!(feature = self.reducer.feature(), error = %e, "unread live query failed");
                    let count = self.publisher.current().count;
                    self.publisher
                        .publish(UnreadAggregate { count, loading: false, error: Some(e.to_string()) });
                }
                Step::Snapshot(None) => {
                    warn!(feature = self.reducer.feature(), "unread live query closed by store");
                    binding = None;
                    let mut state = self.publisher.current();
                    state.loading = false;
                    self.publisher.publish_if_changed(state);
                }
            }
        }

        drop(binding);
        debug!(feature = self.reducer.feature(), "unread aggregator stopped");
    }

    fn rebind(&self, auth: &AuthContextState, binding: &mut Option<Binding>) {
        let uid = auth.uid();
        if let (Some(uid), Some(active)) = (uid, binding.as_ref()) {
            if active.uid == uid {
                return;
            }
        }

        // Close the previous user's query before opening a new one.
        if let Some(previous) = binding.take() {
            debug!(feature = self.reducer.feature(), uid = %previous.uid, "closing unread live query");
        }

        let Some(uid) = uid else {
            let state = if auth.loading { UnreadAggregate::pending() } else { UnreadAggregate::idle() };
            self.publisher.publish_if_changed(state);
            return;
        };

        let query = self.reducer.query(uid);
        match self.store.listen(&query) {
            Ok(handle) => {
                debug!(feature = self.reducer.feature(), uid, collection = %query.collection, "opened unread live query");
                *binding = Some(Binding { uid: uid.to_owned(), handle });
                self.publisher.publish(UnreadAggregate::pending());
            }
            Err(e) => {
                warn!(feature = self.reducer.feature(), uid, error = %e, "unread live query could not be opened");
                self.publisher
                    .publish(UnreadAggregate { count: 0, loading: false, error: Some(e.to_string()) });
            }
        }
    }
}
