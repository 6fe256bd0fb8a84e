//! Session, auth-state, unread-count and locale synchronization for the
//! merchant portal.
//!
//! This crate owns the runtime-agnostic core shared by the Leptos `client`
//! and the SSR host. It never touches the browser or the network directly:
//! every external service sits behind a boundary trait (`KeyValueStorage`,
//! `IdentityProvider`, `DocumentStore`, `CookieJar`, `PageHost`) that the
//! client implements with `web-sys`/`gloo-net` and tests implement in memory.
//!
//! DATA FLOW
//! =========
//! identity provider -> `AuthBridge` -> `SessionStore` + auth publisher ->
//! route guard / UI. Document store -> live queries -> `UnreadAggregator`s ->
//! badges. `LocaleContext` is independent.

pub mod auth;
pub mod channel;
pub mod config;
pub mod documents;
pub mod guard;
pub mod i18n;
pub mod identity;
pub mod locale;
pub mod session;
pub mod storage;
pub mod unread;
