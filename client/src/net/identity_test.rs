use super::*;
use futures::StreamExt;
use futures::executor::block_on;
use portal::storage::MemoryStorage;

fn provider() -> (FirebaseIdentity, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let config = FirebaseConfig { api_key: "k".into(), project_id: "p".into(), poll_interval_ms: 5_000 };
    (FirebaseIdentity::new(&config, storage.clone()), storage)
}

fn merchant() -> IdentityRecord {
    IdentityRecord {
        uid: "m1".into(),
        email: Some("shop@example.com".into()),
        display_name: None,
        photo_url: None,
    }
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn endpoint_urls_carry_api_key() {
    assert_eq!(
        sign_in_url("abc"),
        "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=abc"
    );
    assert_eq!(refresh_url("abc"), "https://securetoken.googleapis.com/v1/token?key=abc");
}

#[test]
fn parse_sign_in_maps_fields_and_drops_empty_strings() {
    let body = r#"{
        "localId": "m1",
        "email": "shop@example.com",
        "displayName": "",
        "idToken": "id-1",
        "refreshToken": "rt-1",
        "expiresIn": "3600",
        "registered": true
    }"#;
    let (user, token) = parse_sign_in(body).unwrap();
    assert_eq!(user, merchant());
    assert_eq!(token, AccessToken { token: "id-1".into(), refresh_token: Some("rt-1".into()) });
}

#[test]
fn parse_sign_in_requires_id_token() {
    let err = parse_sign_in(r#"{"localId":"m1"}"#).unwrap_err();
    assert!(matches!(err, AuthError::Parse(_)));
}

#[test]
fn parse_refresh_reads_snake_case_fields() {
    let token = parse_refresh(r#"{"id_token":"id-2","refresh_token":"rt-2","expires_in":"3600"}"#).unwrap();
    assert_eq!(token, AccessToken { token: "id-2".into(), refresh_token: Some("rt-2".into()) });
}

#[test]
fn error_code_reads_firebase_error_body() {
    let body = r#"{"error":{"code":400,"message":"INVALID_PASSWORD","errors":[]}}"#;
    assert_eq!(error_code(body).as_deref(), Some("INVALID_PASSWORD"));
    assert_eq!(error_code("not json"), None);
    assert!(matches!(rejection(400, body), AuthError::Rejected { status: 400 }));
}

// =============================================================
// Account persistence and auth-state events
// =============================================================

#[test]
fn restore_without_account_publishes_signed_out() {
    let (identity, _) = provider();
    assert_eq!(identity.restore(), None);
    let mut events = identity.auth_state_changes();
    assert_eq!(block_on(events.next()), Some(None));
}

#[test]
fn sign_in_persists_account_and_publishes_user() {
    let (identity, storage) = provider();
    let mut events = identity.auth_state_changes();
    identity.accept_sign_in(merchant(), AccessToken { token: "id-1".into(), refresh_token: Some("rt-1".into()) });

    assert_eq!(block_on(events.next()), Some(Some(merchant())));
    assert_eq!(identity.current_user(), Some(merchant()));
    assert!(storage.get(ACCOUNT_KEY).unwrap().contains("rt-1"));

    let restored = FirebaseIdentity::new(&FirebaseConfig::default(), storage.clone());
    assert_eq!(restored.restore(), Some(merchant()));
}

#[test]
fn sign_in_token_is_handed_out_once() {
    let (identity, _) = provider();
    identity.accept_sign_in(merchant(), AccessToken { token: "id-1".into(), refresh_token: Some("rt-1".into()) });

    let first = block_on(identity.access_token(&merchant())).unwrap();
    assert_eq!(first.token, "id-1");

    // Second request refreshes, which needs a browser in this build.
    let err = block_on(identity.access_token(&merchant())).unwrap_err();
    assert!(matches!(err, AuthError::Unavailable(_)));
}

#[test]
fn access_token_without_account_is_missing_credential() {
    let (identity, _) = provider();
    let err = block_on(identity.access_token(&merchant())).unwrap_err();
    assert!(matches!(err, AuthError::MissingCredential { uid } if uid == "m1"));
}

#[test]
fn fresh_token_is_not_handed_to_another_user() {
    let (identity, _) = provider();
    identity.accept_sign_in(merchant(), AccessToken { token: "id-1".into(), refresh_token: None });
    let other = IdentityRecord { uid: "m2".into(), ..merchant() };
    assert!(block_on(identity.access_token(&other)).is_err());
    assert_eq!(block_on(identity.access_token(&merchant())).unwrap().token, "id-1");
}

#[test]
fn corrupt_account_is_discarded() {
    let (identity, storage) = provider();
    storage.set(ACCOUNT_KEY, "{broken");
    assert_eq!(identity.restore(), None);
    assert_eq!(storage.get(ACCOUNT_KEY), None);
}

#[test]
fn sign_out_forgets_account_and_publishes_none() {
    let (identity, storage) = provider();
    identity.accept_sign_in(merchant(), AccessToken { token: "id-1".into(), refresh_token: Some("rt-1".into()) });
    let mut events = identity.auth_state_changes();
    assert_eq!(block_on(events.next()), Some(Some(merchant())));

    identity.sign_out();
    assert_eq!(block_on(events.next()), Some(None));
    assert_eq!(storage.get(ACCOUNT_KEY), None);
    assert!(block_on(identity.access_token(&merchant())).is_err());
}

// =============================================================
// Refresh token rotation
// =============================================================

fn signed_in(identity: &FirebaseIdentity) -> StoredAccount {
    identity.accept_sign_in(merchant(), AccessToken { token: "id-1".into(), refresh_token: Some("rt-1".into()) });
    identity.stored_account().unwrap()
}

#[test]
fn rotated_refresh_token_replaces_stored_account() {
    let (identity, _) = provider();
    let account = signed_in(&identity);
    identity.rotate_refresh_token(&account, "rt-2");

    let stored = identity.stored_account().unwrap();
    assert_eq!(stored.user, merchant());
    assert_eq!(stored.refresh_token, "rt-2");
}

#[test]
fn rotation_after_sign_out_does_not_restore_account() {
    let (identity, storage) = provider();
    let account = signed_in(&identity);
    identity.sign_out();
    identity.rotate_refresh_token(&account, "rt-2");

    assert_eq!(storage.get(ACCOUNT_KEY), None);
    let reloaded = FirebaseIdentity::new(&FirebaseConfig::default(), storage.clone());
    assert_eq!(reloaded.restore(), None);
}

#[test]
fn rotation_for_a_replaced_account_is_dropped() {
    let (identity, _) = provider();
    let account = signed_in(&identity);
    let other = IdentityRecord { uid: "m2".into(), ..merchant() };
    identity.accept_sign_in(other.clone(), AccessToken { token: "id-9".into(), refresh_token: Some("rt-9".into()) });
    identity.rotate_refresh_token(&account, "rt-2");

    let stored = identity.stored_account().unwrap();
    assert_eq!(stored.user, other);
    assert_eq!(stored.refresh_token, "rt-9");
}
