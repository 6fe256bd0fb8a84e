//! Route guard decisions and post-login redirect memory.
//!
//! SYSTEM CONTEXT
//! ==============
//! The view layer asks the guard what to do with a protected route on every
//! change of auth state, route, or navigation handle. Denying a visitor
//! records the requested path in tab-scoped storage so the login page can
//! send them back after signing in.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;

use tracing::debug;

use crate::auth::AuthContextState;
use crate::storage::KeyValueStorage;

pub const REDIRECT_KEY: &str = "redirectAfterLogin";

/// Guard state for a protected subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardState {
    /// Auth is still loading; render nothing.
    Checking,
    /// Not authenticated; redirect to login.
    Denied,
    /// Authenticated; render children.
    Allowed,
}

/// Pure guard decision. `starved` marks an auth wait that hit its timeout,
/// which is treated as signed out.
#[must_use]
pub fn evaluate(auth: &AuthContextState, starved: bool) -> GuardState {
    if auth.loading && !starved {
        GuardState::Checking
    } else if auth.is_authenticated() {
        GuardState::Allowed
    } else {
        GuardState::Denied
    }
}

/// What the view layer should do after a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    Wait,
    Render,
    Redirect { to: String },
}

/// Guard with redirect memory in tab-scoped storage.
#[derive(Clone)]
pub struct RouteGuard {
    memory: Arc<dyn KeyValueStorage>,
    login_path: String,
}

impl RouteGuard {
    pub fn new(memory: Arc<dyn KeyValueStorage>, login_path: impl Into<String>) -> Self {
        Self { memory, login_path: login_path.into() }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Evaluate the guard for `current_path`. A denial records the path.
    pub fn check(&self, auth: &AuthContextState, starved: bool, current_path: &str) -> GuardOutcome {
        match evaluate(auth, starved) {
            GuardState::Checking => GuardOutcome::Wait,
            GuardState::Allowed => GuardOutcome::Render,
            GuardState::Denied => {
                self.remember(current_path);
                debug!(path = current_path, "route guard denied; redirecting to login");
                GuardOutcome::Redirect { to: self.login_path.clone() }
            }
        }
    }

    /// Record `path` for post-login restoration if it is a safe target.
    pub fn remember(&self, path: &str) {
        if self.is_restorable(path) {
            self.memory.set(REDIRECT_KEY, path);
        }
    }

    /// Take (and forget) the recorded path.
    pub fn take_redirect(&self) -> Option<String> {
        let path = self.memory.get(REDIRECT_KEY)?;
        self.memory.remove(REDIRECT_KEY);
        self.is_restorable(&path).then_some(path)
    }

    /// Where to go after a successful sign-in.
    pub fn post_login_target(&self, fallback: &str) -> String {
        self.take_redirect().unwrap_or_else(|| fallback.to_owned())
    }

    fn is_restorable(&self, path: &str) -> bool {
        is_local_path(path) && path_only(path) != self.login_path
    }
}

impl std::fmt::Debug for RouteGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteGuard")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

/// Same-origin absolute path: `/x`, never `//host` or `/\host`.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

fn path_only(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}
