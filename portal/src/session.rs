//! Browser-persisted session: access token, refresh token, email and a
//! denormalized user snapshot.
//!
//! DESIGN
//! ======
//! `SessionStore` is constructed explicitly over an injected
//! `KeyValueStorage` and cloned into whoever needs it (auth bridge, document
//! adapters, pages). There is no global instance.
//!
//! Writes are per key with no transaction. To keep `token => user` true
//! between individual writes, `store_sign_in` writes the user before the
//! token and `clear_all` removes the token first.
//!
//! ERROR HANDLING
//! ==============
//! The user blob is untrusted: malformed JSON is logged and read as absent.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::identity::IdentityRecord;
use crate::storage::KeyValueStorage;

pub const TOKEN_KEY: &str = "token";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const EMAIL_KEY: &str = "email";
pub const USER_KEY: &str = "user";

/// Possibly-stale copy of the identity provider's user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub uid: String,
    pub email: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<&IdentityRecord> for UserSnapshot {
    fn from(record: &IdentityRecord) -> Self {
        Self {
            uid: record.uid.clone(),
            email: record.email.clone(),
            display_name: record.display_name.clone(),
            photo_url: record.photo_url.clone(),
        }
    }
}

/// All four persisted session fields read at once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    pub email: Option<String>,
    pub user: Option<UserSnapshot>,
}

impl Session {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.refresh_token.is_none() && self.email.is_none() && self.user.is_none()
    }
}

/// Session fields persisted in a key-value store.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn set_token(&self, token: &str) {
        self.storage.set(TOKEN_KEY, token);
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    pub fn clear_token(&self) {
        self.storage.remove(TOKEN_KEY);
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.storage.set(REFRESH_TOKEN_KEY, token);
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    pub fn clear_refresh_token(&self) {
        self.storage.remove(REFRESH_TOKEN_KEY);
    }

    pub fn set_email(&self, email: &str) {
        self.storage.set(EMAIL_KEY, email);
    }

    #[must_use]
    pub fn email(&self) -> Option<String> {
        self.storage.get(EMAIL_KEY)
    }

    pub fn clear_email(&self) {
        self.storage.remove(EMAIL_KEY);
    }

    /// Serialize `user` as JSON under the user key.
    pub fn set_user<T: Serialize>(&self, user: &T) {
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.set(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "session user not serializable; keeping previous value"),
        }
    }

    /// Deserialize the stored user blob. Missing or malformed blobs read as `None`.
    #[must_use]
    pub fn user<T: DeserializeOwned>(&self) -> Option<T> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stored session user is malformed; treating as absent");
                None
            }
        }
    }

    pub fn clear_user(&self) {
        self.storage.remove(USER_KEY);
    }

    /// Remove every session field, token first.
    pub fn clear_all(&self) {
        self.clear_token();
        self.clear_refresh_token();
        self.clear_email();
        self.clear_user();
    }

    /// Persist a signed-in identity together with its access token.
    pub fn store_sign_in(&self, record: &IdentityRecord, token: &str, refresh_token: Option<&str>) {
        self.set_user(&UserSnapshot::from(record));
        match record.email.as_deref() {
            Some(email) => self.set_email(email),
            None => self.clear_email(),
        }
        match refresh_token {
            Some(refresh) => self.set_refresh_token(refresh),
            None => self.clear_refresh_token(),
        }
        self.set_token(token);
    }

    /// Read all four fields.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            refresh_token: self.refresh_token(),
            email: self.email(),
            user: self.user(),
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
