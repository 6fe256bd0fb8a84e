//! Email + password sign-in page.
//!
//! SYSTEM CONTEXT
//! ==============
//! Signs in through `FirebaseIdentity`. The page never navigates on its own
//! after a successful request: the auth bridge publishes the signed-in state
//! once the token is stored, and the signed-in redirect then sends the user
//! to the recorded destination or the home route. If the bridge falls back
//! to signed-out instead, the form reports a failed sign-in.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;
use leptos_router::hooks::use_navigate;
use portal::auth::AuthContextState;
use portal::channel::StateSubscriber;

use crate::state::auth::AuthSignal;
use crate::state::locale::{LocaleSignal, dir, tr};
use crate::state::services::PortalServices;
use crate::util::auth::install_signed_in_redirect;

/// Trim and check the form; errors are message keys.
pub fn validate_login_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err("login.error.email");
    }
    if password.is_empty() {
        return Err("login.error.password");
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Wait for the auth bridge to answer an accepted sign-in for `uid`.
///
/// `updates` must be subscribed before the request is sent.
pub async fn confirm_sign_in(mut updates: StateSubscriber<AuthContextState>, uid: &str) -> Result<(), &'static str> {
    match updates.changed().await {
        Some(state) if state.uid() == Some(uid) => Ok(()),
        _ => Err("login.error.failed"),
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    let auth = expect_context::<AuthSignal>();
    let locale = expect_context::<LocaleSignal>();
    let services = expect_context::<PortalServices>();

    install_signed_in_redirect(auth, services.guard.clone(), services.config.home_path.clone(), use_navigate());

    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(None::<&'static str>);
    let busy = RwSignal::new(false);

    let identity = services.identity.clone();
    let bridge = services.bridge.clone();
    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_login_input(&email.get(), &password.get()) {
            Ok(values) => values,
            Err(key) => {
                error.set(Some(key));
                return;
            }
        };
        error.set(None);
        busy.set(true);

        #[cfg(feature = "hydrate")]
        {
            let identity = identity.clone();
            let updates = bridge.subscribe();
            leptos::task::spawn_local(async move {
                let outcome = match identity.sign_in_with_password(&email_value, &password_value).await {
                    Ok(user) => confirm_sign_in(updates, &user.uid).await,
                    Err(e) => {
                        tracing::warn!(error = %e, "sign-in failed");
                        Err("login.error.failed")
                    }
                };
                if let Err(key) = outcome {
                    error.set(Some(key));
                    busy.set(false);
                }
            });
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (&identity, &bridge, email_value, password_value);
        }
    };

    let error_text = move || error.get().map(|key| portal::i18n::translate(locale.get().locale, key).to_owned());

    view! {
        <div class="login-page" dir=dir(locale)>
            <div class="login-card">
                <h1>{tr(locale, "app.title")}</h1>
                <p class="login-card__subtitle">{tr(locale, "login.title")}</p>
                <form class="login-form" on:submit=on_submit>
                    <label class="login-label">
                        {tr(locale, "login.email")}
                        <input
                            class="login-input"
                            type="email"
                            autocomplete="username"
                            placeholder="you@example.com"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </label>
                    <label class="login-label">
                        {tr(locale, "login.password")}
                        <input
                            class="login-input"
                            type="password"
                            autocomplete="current-password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                    </label>
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        {move || if busy.get() { tr(locale, "login.busy")() } else { tr(locale, "login.submit")() }}
                    </button>
                </form>
                <Show when=move || error.get().is_some()>
                    <p class="login-message" role="alert">{error_text}</p>
                </Show>
            </div>
        </div>
    }
}
