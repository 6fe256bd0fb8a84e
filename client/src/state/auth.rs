//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Used by route guards and user-aware components to coordinate login
//! redirects and identity-dependent rendering. The signal is a mirror of the
//! auth bridge's publisher; only the bridge writes it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use leptos::prelude::RwSignal;
use portal::auth::AuthContextState;

/// Context type for the mirrored auth state.
pub type AuthSignal = RwSignal<AuthContextState>;

/// Name to greet the signed-in user with: display name, else email, else uid.
pub fn greeting_name(state: &AuthContextState) -> Option<String> {
    let user = state.user.as_ref()?;
    let name = [user.display_name.as_deref(), user.email.as_deref()]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .map_or_else(|| user.uid.clone(), str::to_owned);
    Some(name)
}
