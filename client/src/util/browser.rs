//! Browser adapters for the portal's storage, cookie and page boundaries.
//!
//! SYSTEM CONTEXT
//! ==============
//! The core crate only sees `KeyValueStorage`, `CookieJar` and `PageHost`.
//! These unit structs resolve `window` on every call instead of holding
//! `web_sys` handles, which are not `Send`, so they can live inside shared
//! services and Leptos contexts.
//!
//! TRADE-OFFS
//! ==========
//! Every browser failure (storage disabled, quota exceeded, no document) is
//! swallowed: reads return `None`, writes are dropped. Without the `hydrate`
//! feature all adapters are no-ops so server rendering stays deterministic.

use portal::locale::{CookieJar, Direction, PageHost};
use portal::storage::KeyValueStorage;

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

#[cfg(feature = "hydrate")]
fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

/// `window.localStorage`: the persisted session lives here.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.get_item(key).ok().flatten()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            None
        }
    }

    fn set(&self, key: &str, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = local_storage() {
                let _ = storage.set_item(key, value);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
        }
    }

    fn remove(&self, key: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = local_storage() {
                let _ = storage.remove_item(key);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
        }
    }
}

/// `window.sessionStorage`: tab-scoped, used for redirect memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStorage;

impl KeyValueStorage for SessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            session_storage()?.get_item(key).ok().flatten()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            None
        }
    }

    fn set(&self, key: &str, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = session_storage() {
                let _ = storage.set_item(key, value);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
        }
    }

    fn remove(&self, key: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(storage) = session_storage() {
                let _ = storage.remove_item(key);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
        }
    }
}

/// `document.cookie`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentCookies;

#[cfg(feature = "hydrate")]
fn html_document() -> Option<web_sys::HtmlDocument> {
    use wasm_bindgen::JsCast;
    web_sys::window()?.document()?.dyn_into::<web_sys::HtmlDocument>().ok()
}

impl CookieJar for DocumentCookies {
    fn get(&self, name: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            let header = html_document()?.cookie().ok()?;
            portal::locale::cookie_value(&header, name).map(str::to_owned)
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = name;
            None
        }
    }

    fn set(&self, cookie: &str) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(doc) = html_document() {
                let _ = doc.set_cookie(cookie);
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = cookie;
        }
    }
}

/// The current page: `<html lang dir>` and `location.reload()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserPage;

impl PageHost for BrowserPage {
    fn apply_locale(&self, lang: &str, direction: Direction) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(el) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.document_element())
            {
                let _ = el.set_attribute("lang", lang);
                let _ = el.set_attribute("dir", direction.as_str());
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (lang, direction);
        }
    }

    fn reload(&self) {
        #[cfg(feature = "hydrate")]
        {
            if let Some(window) = web_sys::window() {
                let _ = window.location().reload();
            }
        }
    }
}
