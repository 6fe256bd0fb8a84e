use super::*;

#[test]
fn validate_trims_email_and_keeps_password() {
    assert_eq!(
        validate_login_input("  shop@example.com  ", " secret "),
        Ok(("shop@example.com".to_owned(), " secret ".to_owned()))
    );
}

#[test]
fn validate_requires_email_with_at_sign() {
    assert_eq!(validate_login_input("   ", "secret"), Err("login.error.email"));
    assert_eq!(validate_login_input("shop.example.com", "secret"), Err("login.error.email"));
}

#[test]
fn validate_requires_password() {
    assert_eq!(validate_login_input("shop@example.com", ""), Err("login.error.password"));
}

#[test]
fn error_keys_exist_in_both_bundles() {
    for key in ["login.error.email", "login.error.password", "login.error.failed"] {
        for locale in portal::locale::Locale::ALL {
            assert!(portal::i18n::keys(locale).contains(&key), "{key} missing for {locale}");
        }
    }
}

// =============================================================
// Sign-in confirmation
// =============================================================

fn merchant(uid: &str) -> portal::identity::IdentityRecord {
    portal::identity::IdentityRecord {
        uid: uid.to_owned(),
        email: Some("shop@example.com".to_owned()),
        display_name: None,
        photo_url: None,
    }
}

#[test]
fn sign_in_is_confirmed_when_bridge_publishes_the_user() {
    let auth = portal::channel::StatePublisher::new(AuthContextState::signed_out());
    let updates = auth.subscribe();
    auth.publish(AuthContextState::signed_in(merchant("m1")));
    assert_eq!(futures::executor::block_on(confirm_sign_in(updates, "m1")), Ok(()));
}

#[test]
fn bridge_falling_back_to_signed_out_fails_the_form() {
    let auth = portal::channel::StatePublisher::new(AuthContextState::signed_out());
    let updates = auth.subscribe();
    auth.publish(AuthContextState::signed_out());
    assert_eq!(futures::executor::block_on(confirm_sign_in(updates, "m1")), Err("login.error.failed"));
}

#[test]
fn closed_bridge_fails_the_form() {
    let auth = portal::channel::StatePublisher::new(AuthContextState::signed_out());
    let updates = auth.subscribe();
    drop(auth);
    assert_eq!(futures::executor::block_on(confirm_sign_in(updates, "m1")), Err("login.error.failed"));
}
