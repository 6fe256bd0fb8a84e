//! Request-scoped cookie access for server rendering.
//!
//! SYSTEM CONTEXT
//! ==============
//! During SSR the locale must come from the request's `Cookie` header so the
//! server-rendered markup matches what the browser will hydrate.

#[cfg(test)]
#[path = "request_test.rs"]
mod request_test;

use portal::locale::{CookieJar, cookie_value};

/// Read-only cookie jar over a raw `Cookie` header. Writes are dropped.
#[derive(Clone, Debug, Default)]
pub struct RequestCookies {
    header: Option<String>,
}

impl RequestCookies {
    pub fn new(header: Option<String>) -> Self {
        Self { header }
    }

    /// Cookies of the request currently being rendered, if any.
    pub fn current() -> Self {
        Self::new(request_cookie_header())
    }
}

impl CookieJar for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        cookie_value(self.header.as_deref()?, name).map(str::to_owned)
    }

    fn set(&self, _cookie: &str) {}
}

/// Raw `Cookie` header of the current SSR request.
pub fn request_cookie_header() -> Option<String> {
    #[cfg(feature = "ssr")]
    {
        let parts = leptos::prelude::use_context::<http::request::Parts>()?;
        let value = parts.headers.get(http::header::COOKIE)?;
        value.to_str().ok().map(str::to_owned)
    }
    #[cfg(not(feature = "ssr"))]
    {
        None
    }
}
