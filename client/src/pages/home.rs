//! Guarded merchant home: greeting, unread badges, locale switch, sign-out.

use leptos::prelude::*;

use crate::components::locale_toggle::LocaleToggle;
use crate::components::route_guard::RequireAuth;
use crate::components::unread_badge::UnreadBadge;
use crate::state::auth::{AuthSignal, greeting_name};
use crate::state::locale::{LocaleSignal, dir, tr};
use crate::state::services::PortalServices;
use crate::state::unread::{ChatUnreadCount, NotificationUnreadCount};

#[component]
pub fn HomePage() -> impl IntoView {
    view! {
        <RequireAuth>
            <Dashboard/>
        </RequireAuth>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let auth = expect_context::<AuthSignal>();
    let locale = expect_context::<LocaleSignal>();
    let identity = expect_context::<PortalServices>().identity;
    let ChatUnreadCount(chat) = expect_context::<ChatUnreadCount>();
    let NotificationUnreadCount(notifications) = expect_context::<NotificationUnreadCount>();

    let name = move || greeting_name(&auth.get()).unwrap_or_default();
    let on_sign_out = move |_| identity.sign_out();

    view! {
        <main class="home-page" dir=dir(locale)>
            <header class="home-header">
                <h1 class="home-header__title">{tr(locale, "home.greeting")} ", " {name}</h1>
                <div class="home-header__actions">
                    <LocaleToggle/>
                    <button class="home-sign-out" type="button" on:click=on_sign_out>
                        {tr(locale, "home.signOut")}
                    </button>
                </div>
            </header>
            <p class="home-subtitle">{tr(locale, "home.subtitle")}</p>
            <ul class="home-counters">
                <li class="home-counter">
                    <span class="home-counter__label">{tr(locale, "home.chat")}</span>
                    <UnreadBadge state=chat/>
                </li>
                <li class="home-counter">
                    <span class="home-counter__label">{tr(locale, "home.notifications")}</span>
                    <UnreadBadge state=notifications/>
                </li>
            </ul>
        </main>
    }
}
