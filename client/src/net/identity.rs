//! Firebase Authentication over the Identity Toolkit REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `FirebaseIdentity` is the portal's `IdentityProvider`. It signs users in
//! with email and password, keeps the signed-in account (user record plus
//! refresh token) in `localStorage`, and exchanges the refresh token for a
//! fresh ID token whenever the auth bridge asks for one.
//!
//! Auth-state events fan out through an `AuthStateHub`: `restore` publishes
//! the persisted account at startup, sign-in and sign-out publish as they
//! happen.
//!
//! ERROR HANDLING
//! ==============
//! Transport failures map to `AuthError::Request`, non-2xx answers to
//! `AuthError::Rejected` (with the Firebase error code logged), unreadable
//! bodies to `AuthError::Parse`. A corrupt persisted account is discarded.
//! Without the `hydrate` feature every network call returns
//! `AuthError::Unavailable`.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::sync::{Arc, Mutex, PoisonError};

use portal::config::FirebaseConfig;
use portal::identity::{AccessToken, AuthError, AuthStateHub, AuthStateStream, IdentityProvider, IdentityRecord};
use portal::storage::KeyValueStorage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Storage key of the persisted Firebase account.
pub const ACCOUNT_KEY: &str = "firebaseAccount";

#[cfg(any(test, feature = "hydrate"))]
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
#[cfg(any(test, feature = "hydrate"))]
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct StoredAccount {
    user: IdentityRecord,
    refresh_token: String,
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    profile_picture: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[cfg(any(test, feature = "hydrate"))]
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(any(test, feature = "hydrate"))]
fn sign_in_url(api_key: &str) -> String {
    format!("{IDENTITY_TOOLKIT_URL}/accounts:signInWithPassword?key={api_key}")
}

#[cfg(any(test, feature = "hydrate"))]
fn refresh_url(api_key: &str) -> String {
    format!("{SECURE_TOKEN_URL}/token?key={api_key}")
}

#[cfg(any(test, feature = "hydrate"))]
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(any(test, feature = "hydrate"))]
fn parse_sign_in(body: &str) -> Result<(IdentityRecord, AccessToken), AuthError> {
    let parsed: SignInResponse = serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))?;
    let user = IdentityRecord {
        uid: parsed.local_id,
        email: non_empty(parsed.email),
        display_name: non_empty(parsed.display_name),
        photo_url: non_empty(parsed.profile_picture),
    };
    let token = AccessToken { token: parsed.id_token, refresh_token: non_empty(parsed.refresh_token) };
    Ok((user, token))
}

#[cfg(any(test, feature = "hydrate"))]
fn parse_refresh(body: &str) -> Result<AccessToken, AuthError> {
    let parsed: RefreshResponse = serde_json::from_str(body).map_err(|e| AuthError::Parse(e.to_string()))?;
    Ok(AccessToken { token: parsed.id_token, refresh_token: non_empty(parsed.refresh_token) })
}

/// Firebase error code (`INVALID_PASSWORD`, `TOKEN_EXPIRED`, ...) in an error body.
#[cfg(any(test, feature = "hydrate"))]
fn error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error.message)
}

#[cfg(any(test, feature = "hydrate"))]
fn rejection(status: u16, body: &str) -> AuthError {
    let code = error_code(body).unwrap_or_default();
    warn!(status, code = %code, "firebase auth request rejected");
    AuthError::Rejected { status }
}

#[cfg(feature = "hydrate")]
async fn post_json(url: &str, body: &serde_json::Value) -> Result<String, AuthError> {
    let resp = gloo_net::http::Request::post(url)
        .json(body)
        .map_err(|e| AuthError::Request(e.to_string()))?
        .send()
        .await
        .map_err(|e| AuthError::Request(e.to_string()))?;
    let status = resp.status();
    let text = resp.text().await.map_err(|e| AuthError::Parse(e.to_string()))?;
    if !resp.ok() {
        return Err(rejection(status, &text));
    }
    Ok(text)
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Identity provider backed by Firebase Authentication.
pub struct FirebaseIdentity {
    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    api_key: String,
    accounts: Arc<dyn KeyValueStorage>,
    hub: AuthStateHub,
    /// Token issued by the last sign-in, handed out once before refreshing.
    fresh: Mutex<Option<(String, AccessToken)>>,
}

impl FirebaseIdentity {
    pub fn new(config: &FirebaseConfig, accounts: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            api_key: config.api_key.clone(),
            accounts,
            hub: AuthStateHub::new(),
            fresh: Mutex::new(None),
        }
    }

    /// Publish the persisted account (or signed-out) as the first auth state.
    pub fn restore(&self) -> Option<IdentityRecord> {
        let user = self.stored_account().map(|account| account.user);
        self.hub.publish(user.clone());
        user
    }

    /// Last published identity, if any.
    pub fn current_user(&self) -> Option<IdentityRecord> {
        self.hub.current().flatten()
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Firebase rejects the
    /// credentials, or the response cannot be parsed.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<IdentityRecord, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let body = serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            });
            let text = post_json(&sign_in_url(&self.api_key), &body).await?;
            let (user, token) = parse_sign_in(&text)?;
            self.accept_sign_in(user.clone(), token);
            Ok(user)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (email, password);
            Err(AuthError::Unavailable("sign-in requires a browser".to_owned()))
        }
    }

    /// Forget the account and publish signed-out.
    pub fn sign_out(&self) {
        self.accounts.remove(ACCOUNT_KEY);
        *self.fresh.lock().unwrap_or_else(PoisonError::into_inner) = None;
        info!("signed out");
        self.hub.publish(None);
    }

    #[cfg_attr(not(feature = "hydrate"), allow(dead_code))]
    fn accept_sign_in(&self, user: IdentityRecord, token: AccessToken) {
        if let Some(refresh_token) = &token.refresh_token {
            self.persist(&StoredAccount { user: user.clone(), refresh_token: refresh_token.clone() });
        }
        *self.fresh.lock().unwrap_or_else(PoisonError::into_inner) = Some((user.uid.clone(), token));
        info!(uid = %user.uid, "signed in with password");
        self.hub.publish(Some(user));
    }

    fn take_fresh(&self, uid: &str) -> Option<AccessToken> {
        let mut fresh = self.fresh.lock().unwrap_or_else(PoisonError::into_inner);
        match fresh.take() {
            Some((owner, token)) if owner == uid => Some(token),
            other => {
                *fresh = other;
                None
            }
        }
    }

    fn stored_account(&self) -> Option<StoredAccount> {
        let raw = self.accounts.get(ACCOUNT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(account) => Some(account),
            Err(e) => {
                warn!(error = %e, "discarding unreadable stored account");
                self.accounts.remove(ACCOUNT_KEY);
                None
            }
        }
    }

    fn persist(&self, account: &StoredAccount) {
        match serde_json::to_string(account) {
            Ok(raw) => self.accounts.set(ACCOUNT_KEY, &raw),
            Err(e) => warn!(error = %e, "failed to serialize account"),
        }
    }

    /// Persist a rotated refresh token, unless the account was signed out or
    /// replaced while the refresh was in flight.
    fn rotate_refresh_token(&self, issued_for: &StoredAccount, next: &str) {
        if next == issued_for.refresh_token {
            return;
        }
        match self.stored_account() {
            Some(current) if current == *issued_for => {
                self.persist(&StoredAccount { user: current.user, refresh_token: next.to_owned() });
            }
            _ => debug!(uid = %issued_for.user.uid, "account changed during refresh; dropping rotated token"),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        #[cfg(feature = "hydrate")]
        {
            let body = serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token,
            });
            let text = post_json(&refresh_url(&self.api_key), &body).await?;
            parse_refresh(&text)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = refresh_token;
            Err(AuthError::Unavailable("token refresh requires a browser".to_owned()))
        }
    }
}

impl std::fmt::Debug for FirebaseIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentity")
            .field("current_user", &self.current_user().map(|u| u.uid))
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait(?Send)]
impl IdentityProvider for FirebaseIdentity {
    fn auth_state_changes(&self) -> AuthStateStream {
        self.hub.subscribe()
    }

    async fn access_token(&self, user: &IdentityRecord) -> Result<AccessToken, AuthError> {
        if let Some(token) = self.take_fresh(&user.uid) {
            return Ok(token);
        }
        let account = self
            .stored_account()
            .filter(|account| account.user.uid == user.uid)
            .ok_or_else(|| AuthError::MissingCredential { uid: user.uid.clone() })?;
        let token = self.refresh(&account.refresh_token).await?;
        if let Some(next) = &token.refresh_token {
            self.rotate_refresh_token(&account, next);
        }
        Ok(token)
    }
}
