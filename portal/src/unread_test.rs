use super::*;
use crate::documents::{Document, MemoryDocumentStore, StoreError};
use crate::identity::IdentityRecord;
use serde_json::json;

fn user(uid: &str) -> IdentityRecord {
    IdentityRecord { uid: uid.to_owned(), email: None, display_name: None, photo_url: None }
}

fn chat_doc(id: &str, fields: serde_json::Value) -> Document {
    Document::new(id, fields)
}

struct Harness<R> {
    store: Arc<MemoryDocumentStore>,
    auth: StatePublisher<AuthContextState>,
    aggregator: Arc<UnreadAggregator<R>>,
    task: tokio::task::JoinHandle<()>,
}

fn start<R: UnreadReducer + 'static>(reducer: R) -> Harness<R> {
    let store = Arc::new(MemoryDocumentStore::new());
    let auth = StatePublisher::new(AuthContextState::default());
    let aggregator = Arc::new(UnreadAggregator::new(reducer, store.clone()));
    let runner = Arc::clone(&aggregator);
    let sub = auth.subscribe();
    let task = tokio::spawn(async move { runner.run(sub).await });
    Harness { store, auth, aggregator, task }
}

async fn settled(sub: &mut StateSubscriber<UnreadAggregate>, expected: UnreadAggregate) {
    let got = sub.wait_for(|s| *s == expected).await;
    assert_eq!(got, Some(expected));
}

// =============================================================
// Reducers
// =============================================================

#[test]
fn chat_reduce_sums_current_user_counts() {
    let snapshot = Snapshot::new(vec![
        chat_doc("c1", json!({ "unreadCount": { "u1": 3 } })),
        chat_doc("c2", json!({ "unreadCount": { "u1": 2 } })),
    ]);
    assert_eq!(ChatUnread::default().reduce("u1", &snapshot), 5);
}

#[test]
fn chat_reduce_ignores_other_users_and_bad_values() {
    let snapshot = Snapshot::new(vec![
        chat_doc("c1", json!({ "unreadCount": { "u1": 1, "u2": 9 } })),
        chat_doc("c2", json!({ "unreadCount": { "u1": -4 } })),
        chat_doc("c3", json!({ "unreadCount": { "u1": "7" } })),
        chat_doc("c4", json!({})),
        chat_doc("c5", json!({ "unreadCount": { "u1": 2.0 } })),
    ]);
    assert_eq!(ChatUnread::default().reduce("u1", &snapshot), 3);
}

#[test]
fn chat_query_filters_on_participants() {
    let query = ChatUnread::default().query("u1");
    assert_eq!(query.collection, "chats");
    assert_eq!(query.filter, Filter::array_contains("participants", "u1"));
}

#[test]
fn notification_reduce_counts_documents() {
    let docs = (0..4)
        .map(|i| Document::new(format!("n{i}"), json!({ "isRead": false })))
        .collect();
    assert_eq!(NotificationUnread::default().reduce("u1", &Snapshot::new(docs)), 4);
    assert_eq!(NotificationUnread::default().reduce("u1", &Snapshot::default()), 0);
}

#[test]
fn notification_query_is_scoped_to_user() {
    let query = NotificationUnread::default().query("u42");
    assert_eq!(query.collection, "users/u42/notifications");
    assert_eq!(query.filter, Filter::equal("isRead", false));
}

// =============================================================
// Aggregator lifecycle
// =============================================================

#[tokio::test]
async fn signed_out_publishes_zero_without_subscription() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.auth.publish(AuthContextState::signed_out());
    settled(&mut sub, UnreadAggregate::idle()).await;
    assert_eq!(h.store.listener_count(), 0);
    h.task.abort();
}

#[tokio::test]
async fn loading_auth_keeps_aggregate_pending() {
    let h = start(ChatUnread::default());
    tokio::task::yield_now().await;
    assert_eq!(h.aggregator.state(), UnreadAggregate::pending());
    assert_eq!(h.store.listener_count(), 0);
    h.task.abort();
}

#[tokio::test]
async fn chat_count_follows_snapshots() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.store.upsert("chats", "c1", json!({ "participants": ["u1"], "unreadCount": { "u1": 3 } }));
    h.store.upsert("chats", "c2", json!({ "participants": ["u1"], "unreadCount": { "u1": 2 } }));
    h.store.upsert("chats", "c3", json!({ "participants": ["u2"], "unreadCount": { "u1": 50 } }));

    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(5)).await;
    assert_eq!(h.store.listener_count(), 1);

    h.store.upsert("chats", "c2", json!({ "participants": ["u1"], "unreadCount": { "u1": 0 } }));
    settled(&mut sub, UnreadAggregate::ready(3)).await;
    h.task.abort();
}

#[tokio::test]
async fn notification_count_is_cardinality() {
    let h = start(NotificationUnread::default());
    let mut sub = h.aggregator.subscribe();
    for i in 0..4 {
        h.store.upsert("users/u1/notifications", &format!("n{i}"), json!({ "isRead": false }));
    }
    h.store.upsert("users/u1/notifications", "read", json!({ "isRead": true }));

    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(4)).await;
    h.task.abort();
}

#[tokio::test]
async fn empty_snapshot_yields_zero() {
    let h = start(NotificationUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(0)).await;
    h.task.abort();
}

#[tokio::test]
async fn sign_out_closes_subscription_and_resets_count() {
    let h = start(NotificationUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.store.upsert("users/u1/notifications", "n1", json!({ "isRead": false }));
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(1)).await;

    h.auth.publish(AuthContextState::signed_out());
    settled(&mut sub, UnreadAggregate::idle()).await;
    assert_eq!(h.store.listener_count(), 0);

    // Writes after sign-out are not applied.
    h.store.upsert("users/u1/notifications", "n2", json!({ "isRead": false }));
    tokio::task::yield_now().await;
    assert_eq!(h.aggregator.state(), UnreadAggregate::idle());
    h.task.abort();
}

#[tokio::test]
async fn identity_change_replaces_subscription() {
    let h = start(NotificationUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.store.upsert("users/u1/notifications", "n1", json!({ "isRead": false }));
    h.store.upsert("users/u2/notifications", "n1", json!({ "isRead": false }));
    h.store.upsert("users/u2/notifications", "n2", json!({ "isRead": false }));

    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(1)).await;

    h.auth.publish(AuthContextState::signed_in(user("u2")));
    settled(&mut sub, UnreadAggregate::ready(2)).await;
    assert_eq!(h.store.listener_count(), 1);

    // The old user's collection no longer drives the count.
    h.store.upsert("users/u1/notifications", "n9", json!({ "isRead": false }));
    tokio::task::yield_now().await;
    assert_eq!(h.aggregator.state(), UnreadAggregate::ready(2));
    h.task.abort();
}

#[tokio::test]
async fn same_user_republish_keeps_subscription() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(0)).await;

    h.auth.publish(AuthContextState::signed_in(user("u1")));
    tokio::task::yield_now().await;
    assert_eq!(h.store.listener_count(), 1);
    assert_eq!(h.aggregator.state(), UnreadAggregate::ready(0));
    h.task.abort();
}

#[tokio::test]
async fn query_error_is_surfaced_and_count_kept() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.store.upsert("chats", "c1", json!({ "participants": ["u1"], "unreadCount": { "u1": 4 } }));
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(4)).await;

    h.store.fail("chats", &StoreError::Rejected { status: 403 });
    let expected = UnreadAggregate { count: 4, loading: false, error: Some("query rejected: status 403".into()) };
    settled(&mut sub, expected).await;
    h.task.abort();
}

#[tokio::test]
async fn dropping_aggregator_task_closes_subscription() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(0)).await;
    assert_eq!(h.store.listener_count(), 1);

    h.task.abort();
    let _ = h.task.await;
    assert_eq!(h.store.listener_count(), 0);
}

#[tokio::test]
async fn aggregator_stops_when_auth_publisher_dropped() {
    let h = start(ChatUnread::default());
    let mut sub = h.aggregator.subscribe();
    h.auth.publish(AuthContextState::signed_in(user("u1")));
    settled(&mut sub, UnreadAggregate::ready(0)).await;

    drop(h.auth);
    h.task.await.unwrap();
    assert_eq!(h.store.listener_count(), 0);
}
