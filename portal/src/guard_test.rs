use super::*;
use crate::identity::IdentityRecord;
use crate::storage::MemoryStorage;

fn signed_in() -> AuthContextState {
    AuthContextState::signed_in(IdentityRecord {
        uid: "u1".into(),
        email: None,
        display_name: None,
        photo_url: None,
    })
}

fn guard() -> RouteGuard {
    RouteGuard::new(Arc::new(MemoryStorage::new()), "/login")
}

// =============================================================
// evaluate
// =============================================================

#[test]
fn loading_is_checking_even_when_user_present() {
    let mut state = signed_in();
    state.loading = true;
    assert_eq!(evaluate(&state, false), GuardState::Checking);
    assert_eq!(evaluate(&AuthContextState::default(), false), GuardState::Checking);
}

#[test]
fn settled_state_decides_by_authentication() {
    assert_eq!(evaluate(&signed_in(), false), GuardState::Allowed);
    assert_eq!(evaluate(&AuthContextState::signed_out(), false), GuardState::Denied);
}

#[test]
fn starved_loading_is_denied() {
    assert_eq!(evaluate(&AuthContextState::default(), true), GuardState::Denied);
}

// =============================================================
// check / redirect memory
// =============================================================

#[test]
fn check_waits_while_loading_and_records_nothing() {
    let guard = guard();
    assert_eq!(guard.check(&AuthContextState::default(), false, "/orders"), GuardOutcome::Wait);
    assert!(guard.take_redirect().is_none());
}

#[test]
fn denied_path_is_restored_after_sign_in() {
    let guard = guard();
    let outcome = guard.check(&AuthContextState::signed_out(), false, "/orders");
    assert_eq!(outcome, GuardOutcome::Redirect { to: "/login".into() });

    assert_eq!(guard.check(&signed_in(), false, "/orders"), GuardOutcome::Render);
    assert_eq!(guard.post_login_target("/"), "/orders");
}

#[test]
fn redirect_is_consumed_once() {
    let guard = guard();
    guard.remember("/orders?page=2");
    assert_eq!(guard.take_redirect().as_deref(), Some("/orders?page=2"));
    assert_eq!(guard.post_login_target("/"), "/");
}

#[test]
fn external_or_login_targets_are_not_recorded() {
    let guard = guard();
    guard.remember("//evil.example/path");
    guard.remember("https://evil.example");
    guard.remember("/login?next=x");
    assert!(guard.take_redirect().is_none());
}

#[test]
fn tampered_storage_value_is_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    let guard = RouteGuard::new(storage.clone(), "/login");
    storage.set(REDIRECT_KEY, "//evil.example");
    assert_eq!(guard.post_login_target("/"), "/");
}
