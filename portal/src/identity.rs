//! Identity provider boundary.
//!
//! SYSTEM CONTEXT
//! ==============
//! The provider emits the signed-in identity (or none) whenever auth state
//! changes and issues bearer tokens on request. `FirebaseIdentity` in the
//! client implements it over the Identity Toolkit REST API; tests implement
//! it with `AuthStateHub` plus a scripted token source.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::sync::{Mutex, PoisonError};

use futures::channel::mpsc;
use serde::{Deserialize, Serialize};

/// The provider's view of a signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Bearer token issued for an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token or sign-in request could not be sent.
    #[error("auth request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("auth request rejected: status {status}")]
    Rejected { status: u16 },

    /// The provider's response body could not be parsed.
    #[error("auth response parse failed: {0}")]
    Parse(String),

    /// No refresh credential is held for this user.
    #[error("no credential held for user {uid}")]
    MissingCredential { uid: String },

    /// The provider is not usable in this environment (e.g. server rendering).
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Stream of auth-state events. Dropping it unsubscribes.
pub type AuthStateStream = mpsc::UnboundedReceiver<Option<IdentityRecord>>;

/// External authentication service.
#[async_trait::async_trait(?Send)]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to auth-state changes. The current state is delivered first
    /// once the provider has resolved it.
    fn auth_state_changes(&self) -> AuthStateStream;

    /// Fetch a fresh access token for `user`. May perform network I/O.
    async fn access_token(&self, user: &IdentityRecord) -> Result<AccessToken, AuthError>;
}

/// Fan-out of auth-state events to any number of subscribers.
///
/// Remembers the last published state so late subscribers receive it
/// immediately; before the first publication nothing is replayed, which is
/// what keeps consumers in their loading state.
#[derive(Debug, Default)]
pub struct AuthStateHub {
    inner: Mutex<HubInner>,
}

#[derive(Debug, Default)]
struct HubInner {
    current: Option<Option<IdentityRecord>>,
    subscribers: Vec<mpsc::UnboundedSender<Option<IdentityRecord>>>,
}

impl AuthStateHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> AuthStateStream {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = inner.current.clone() {
            let _ = tx.unbounded_send(current);
        }
        inner.subscribers.push(tx);
        rx
    }

    /// Record `state` as current and deliver it to every live subscriber.
    pub fn publish(&self, state: Option<IdentityRecord>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.current = Some(state.clone());
        inner.subscribers.retain(|tx| tx.unbounded_send(state.clone()).is_ok());
    }

    /// Last published state, `None` while unresolved.
    #[must_use]
    pub fn current(&self) -> Option<Option<IdentityRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).current.clone()
    }

    /// Number of subscribers whose stream is still open.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.subscribers.retain(|tx| !tx.is_closed());
        inner.subscribers.len()
    }
}
