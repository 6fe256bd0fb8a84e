//! Auth-state bridge: identity provider -> session store + auth publisher.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards, pages and unread aggregators all read `AuthContextState`
//! through subscribers of the bridge's publisher. The bridge is the only
//! writer of both that state and the persisted session.
//!
//! ORDERING
//! ========
//! Events are applied one at a time in arrival order. For a signed-in event
//! the token is fetched and persisted before the state is published, so a
//! consumer that sees `is_authenticated()` can rely on a stored token.
//!
//! TOKEN REFRESH
//! =============
//! Provider ID tokens expire. `run_refreshing` re-fetches the signed-in
//! user's token whenever the caller's timer fires with no event in between,
//! and writes it back to the session store.
//!
//! ERROR HANDLING
//! ==============
//! A failed token fetch, on sign-in or on refresh, is logged and applied as
//! a sign-out.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::future::Future;
use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use futures::future::{self, Either};
use tracing::{debug, info, warn};

use crate::channel::{StatePublisher, StateSubscriber};
use crate::identity::{IdentityProvider, IdentityRecord};
use crate::session::SessionStore;

/// Reactive auth state consumed by the view layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContextState {
    pub user: Option<IdentityRecord>,
    pub loading: bool,
}

impl Default for AuthContextState {
    /// Mount state: loading until the provider's first callback.
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}

impl AuthContextState {
    #[must_use]
    pub fn signed_in(user: IdentityRecord) -> Self {
        Self { user: Some(user), loading: false }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { user: None, loading: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.uid.as_str())
    }
}

/// Mirrors the provider's auth-state stream into the session store and the
/// auth publisher.
pub struct AuthBridge {
    provider: Arc<dyn IdentityProvider>,
    session: SessionStore,
    publisher: StatePublisher<AuthContextState>,
}

impl AuthBridge {
    pub fn new(provider: Arc<dyn IdentityProvider>, session: SessionStore) -> Self {
        Self { provider, session, publisher: StatePublisher::new(AuthContextState::default()) }
    }

    #[must_use]
    pub fn subscribe(&self) -> StateSubscriber<AuthContextState> {
        self.publisher.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> AuthContextState {
        self.publisher.current()
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Apply one provider event.
    pub async fn apply(&self, event: Option<IdentityRecord>) {
        let Some(user) = event else {
            self.session.clear_all();
            self.publisher.publish(AuthContextState::signed_out());
            debug!("auth state: signed out");
            return;
        };

        match self.provider.access_token(&user).await {
            Ok(token) => {
                self.session
                    .store_sign_in(&user, &token.token, token.refresh_token.as_deref());
                info!(uid = %user.uid, "auth state: signed in");
                self.publisher.publish(AuthContextState::signed_in(user));
            }
            Err(e) => {
                warn!(uid = %user.uid, error = %e, "access token fetch failed; treating as signed out");
                self.session.clear_all();
                self.publisher.publish(AuthContextState::signed_out());
            }
        }
    }

    /// Re-fetch the signed-in user's access token into the session store.
    ///
    /// Does nothing while signed out or loading.
    pub async fn refresh(&self) {
        let Some(user) = self.publisher.current().user else {
            return;
        };

        match self.provider.access_token(&user).await {
            Ok(token) => {
                if let Some(refresh_token) = token.refresh_token.as_deref() {
                    self.session.set_refresh_token(refresh_token);
                }
                self.session.set_token(&token.token);
                debug!(uid = %user.uid, "access token refreshed");
            }
            Err(e) => {
                warn!(uid = %user.uid, error = %e, "access token refresh failed; treating as signed out");
                self.session.clear_all();
                self.publisher.publish(AuthContextState::signed_out());
            }
        }
    }

    /// Subscribe to the provider and apply events until the stream ends.
    ///
    /// The provider subscription lives inside the returned future; dropping
    /// the future releases it. Tokens are never refreshed; see
    /// [`AuthBridge::run_refreshing`].
    pub async fn run(&self) {
        self.run_refreshing(future::pending::<()>).await;
    }

    /// Like [`AuthBridge::run`], and also calls [`AuthBridge::refresh`]
    /// whenever a timer from `sleep` completes before the next event.
    ///
    /// `sleep` is called for a new timer after every event and refresh.
    pub async fn run_refreshing<S, F>(&self, mut sleep: S)
    where
        S: FnMut() -> F,
        F: Future<Output = ()>,
    {
        let mut events = self.provider.auth_state_changes();
        loop {
            let timer = pin!(sleep());
            match future::select(events.next(), timer).await {
                Either::Left((Some(event), _)) => self.apply(event).await,
                Either::Left((None, _)) => break,
                Either::Right(((), _)) => self.refresh().await,
            }
        }
        debug!("auth state stream closed");
    }
}

impl std::fmt::Debug for AuthBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthBridge")
            .field("state", &self.state())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Wait until auth has settled, or until `deadline` completes.
///
/// A provider that never answers is treated as signed out once the deadline
/// fires. Returns signed-out as well if the publisher is dropped.
pub async fn settle<D>(mut subscriber: StateSubscriber<AuthContextState>, deadline: D) -> AuthContextState
where
    D: Future<Output = ()>,
{
    let settled = pin!(subscriber.wait_for(|state| !state.loading));
    let deadline = pin!(deadline);
    match future::select(settled, deadline).await {
        Either::Left((Some(state), _)) => state,
        Either::Left((None, _)) => AuthContextState::signed_out(),
        Either::Right(((), _)) => {
            warn!("identity provider did not respond in time; treating as signed out");
            AuthContextState::signed_out()
        }
    }
}
