//! Shared auth UI helpers.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guarded subtree and the login page both react to auth changes with a
//! navigation: the guard sends denied visitors to the login route, and the
//! login page sends signed-in users on to their recorded destination.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use portal::auth::AuthContextState;
use portal::guard::{GuardOutcome, RouteGuard};

fn replace() -> NavigateOptions {
    NavigateOptions { replace: true, ..NavigateOptions::default() }
}

/// `pathname` plus query string, as recorded for post-login restoration.
pub fn full_path(pathname: &str, search: &str) -> String {
    let search = search.trim_start_matches('?');
    if search.is_empty() {
        pathname.to_owned()
    } else {
        format!("{pathname}?{search}")
    }
}

/// Destination for a visitor on the login page, once they are signed in.
pub fn signed_in_target(state: &AuthContextState, guard: &RouteGuard, home: &str) -> Option<String> {
    (!state.loading && state.is_authenticated()).then(|| guard.post_login_target(home))
}

/// Run the guard on every auth, starvation or route change and redirect
/// to the login route when it denies.
pub fn install_guard_redirect<P, F>(
    auth: RwSignal<AuthContextState>,
    starved: RwSignal<bool>,
    guard: RouteGuard,
    path: P,
    navigate: F,
) where
    P: Fn() -> String + 'static,
    F: Fn(&str, NavigateOptions) + 'static,
{
    Effect::new(move || {
        let outcome = guard.check(&auth.get(), starved.get(), &path());
        if let GuardOutcome::Redirect { to } = outcome {
            navigate(&to, replace());
        }
    });
}

/// Leave the login page as soon as the user is signed in.
pub fn install_signed_in_redirect<F>(auth: RwSignal<AuthContextState>, guard: RouteGuard, home: String, navigate: F)
where
    F: Fn(&str, NavigateOptions) + 'static,
{
    Effect::new(move || {
        if let Some(target) = signed_in_target(&auth.get(), &guard, &home) {
            navigate(&target, replace());
        }
    });
}
