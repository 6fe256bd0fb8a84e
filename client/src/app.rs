//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! `App` is the composition root. It builds the browser adapters, the auth
//! bridge, both unread aggregators and the locale context, mirrors each of
//! their publishers into a signal, and provides signals and service handles
//! to the tree. In the browser the bridge and aggregators run as local tasks
//! that are aborted when the app is torn down.
//!
//! `shell` renders the server document; `<html lang dir>` comes from the
//! request's `NEXT_LOCALE` cookie so right-to-left layouts are correct
//! before hydration.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;
use std::time::Duration;

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Route, Router, Routes},
};
use portal::auth::AuthBridge;
use portal::documents::DocumentStore;
use portal::guard::RouteGuard;
use portal::i18n::translate;
use portal::locale::{CookieJar, LOCALE_COOKIE, LocaleContext, LocaleState, resolve_locale};
use portal::session::SessionStore;
use portal::unread::{ChatUnread, NotificationUnread, UnreadAggregator};

use crate::net::firestore::FirestoreRest;
use crate::net::identity::FirebaseIdentity;
use crate::pages::{home::HomePage, login::LoginPage};
use crate::state::services::PortalServices;
use crate::state::unread::{ChatUnreadCount, NotificationUnreadCount};
use crate::util::browser::{BrowserPage, DocumentCookies, LocalStorage, SessionStorage};
use crate::util::env::load_config;
use crate::util::request::RequestCookies;
use crate::util::task::{mirror, spawn_scoped};

/// Cookie source for the current environment.
fn cookie_jar() -> Arc<dyn CookieJar> {
    if cfg!(feature = "hydrate") {
        Arc::new(DocumentCookies)
    } else {
        Arc::new(RequestCookies::current())
    }
}

/// Browser startup: align `<html lang dir>` with the locale cookie, then
/// publish the persisted account as the first auth state.
fn resume_in_browser(identity: &FirebaseIdentity, locale: &LocaleContext) {
    locale.resync();
    identity.restore();
}

/// Drive the auth bridge, re-fetching the access token every `refresh_every`
/// in the browser.
async fn run_bridge(bridge: Arc<AuthBridge>, refresh_every: Duration) {
    #[cfg(feature = "hydrate")]
    {
        bridge.run_refreshing(move || gloo_timers::future::sleep(refresh_every)).await;
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = refresh_every;
        bridge.run().await;
    }
}

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    let config = load_config();
    let cookie = RequestCookies::current().get(LOCALE_COOKIE);
    let locale = LocaleState::from(resolve_locale(cookie.as_deref(), config.default_locale));

    view! {
        <!DOCTYPE html>
        <html lang=locale.locale.code() dir=locale.direction.as_str()>
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Provides all shared state contexts and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = Arc::new(load_config());
    let session = SessionStore::new(Arc::new(LocalStorage));
    let identity = Arc::new(FirebaseIdentity::new(&config.firebase, Arc::new(LocalStorage)));
    let bridge = Arc::new(AuthBridge::new(identity.clone(), session.clone()));

    let documents: Arc<dyn DocumentStore> = Arc::new(FirestoreRest::new(&config.firebase, session.clone()));
    let chat = Arc::new(UnreadAggregator::new(ChatUnread::new(config.chat_collection.clone()), documents.clone()));
    let notifications = Arc::new(UnreadAggregator::new(
        NotificationUnread::new(config.notifications_collection.clone()),
        documents,
    ));

    let locale_context = Arc::new(
        LocaleContext::new(cookie_jar(), Arc::new(BrowserPage), config.default_locale)
            .with_reload(config.reload_on_locale_change),
    );
    let guard = RouteGuard::new(Arc::new(SessionStorage), config.login_path.clone());

    // Signals first, so every mirror is subscribed before a service publishes.
    let auth = mirror(bridge.subscribe());
    let locale = mirror(locale_context.subscribe());
    let chat_count = mirror(chat.subscribe());
    let notification_count = mirror(notifications.subscribe());

    spawn_scoped(run_bridge(bridge.clone(), Duration::from_millis(config.token_refresh_ms)));
    spawn_scoped({
        let auth = bridge.subscribe();
        async move { chat.run(auth).await }
    });
    spawn_scoped({
        let auth = bridge.subscribe();
        async move { notifications.run(auth).await }
    });
    if cfg!(feature = "hydrate") {
        resume_in_browser(&identity, &locale_context);
    }

    provide_context(auth);
    provide_context(locale);
    provide_context(ChatUnreadCount(chat_count));
    provide_context(NotificationUnreadCount(notification_count));
    provide_context(PortalServices {
        config,
        session,
        identity,
        bridge,
        locale: locale_context,
        guard,
    });

    let title = translate(locale.get_untracked().locale, "app.title").to_owned();

    view! {
        <Stylesheet id="leptos" href="/pkg/merchant-portal.css"/>
        <Title text=title/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("login") view=LoginPage/>
                <Route path=StaticSegment("") view=HomePage/>
            </Routes>
        </Router>
    }
}
