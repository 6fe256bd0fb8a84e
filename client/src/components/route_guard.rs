//! Guarded subtree for authenticated routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! Wraps every protected page. Children render only once auth has settled
//! with a signed-in user; while loading a neutral placeholder is shown, and
//! a denied visitor is sent to the login route with the current path
//! recorded for restoration.
//!
//! TRADE-OFFS
//! ==========
//! A provider that never answers would leave the guard checking forever, so
//! the guard arms a timer of `auth_timeout_ms` and treats a still-loading
//! auth state as signed out once it fires.

use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};
use portal::guard::{GuardState, evaluate};

use crate::state::auth::AuthSignal;
use crate::state::locale::{LocaleSignal, tr};
use crate::state::services::PortalServices;
use crate::util::auth::{full_path, install_guard_redirect};

#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<AuthSignal>();
    let locale = expect_context::<LocaleSignal>();
    let services = expect_context::<PortalServices>();
    let starved = RwSignal::new(false);

    #[cfg(feature = "hydrate")]
    {
        let bridge = services.bridge.clone();
        let timeout = std::time::Duration::from_millis(services.config.auth_timeout_ms);
        crate::util::task::spawn_scoped(async move {
            let deadline = gloo_timers::future::sleep(timeout);
            let _ = portal::auth::settle(bridge.subscribe(), deadline).await;
            if bridge.state().loading {
                starved.set(true);
            }
        });
    }

    let location = use_location();
    let path = move || full_path(&location.pathname.get(), &location.search.get());
    install_guard_redirect(auth, starved, services.guard.clone(), path, use_navigate());

    let state = Memo::new(move |_| evaluate(&auth.get(), starved.get()));
    let loading = tr(locale, "common.loading");
    let redirecting = tr(locale, "common.redirecting");

    view! {
        <Show
            when=move || state.get() == GuardState::Allowed
            fallback=move || {
                let text = move || if state.get() == GuardState::Checking { loading() } else { redirecting() };
                view! { <p class="guard-status" aria-busy="true">{text}</p> }
            }
        >
            {children()}
        </Show>
    }
}
