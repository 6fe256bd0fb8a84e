//! Active language and text direction, persisted in the `NEXT_LOCALE` cookie.
//!
//! DESIGN
//! ======
//! The cookie is the source of truth; `LocaleContext` caches it and
//! re-reads it on `resync`. An explicit change writes the cookie, updates
//! the root element's `lang`/`dir`, and then either reloads the page (so
//! every translation re-resolves) or, when reload is disabled, publishes the
//! new state in place for reactive re-rendering.

#[cfg(test)]
#[path = "locale_test.rs"]
mod locale_test;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::{StatePublisher, StateSubscriber};

pub const LOCALE_COOKIE: &str = "NEXT_LOCALE";
pub const LOCALE_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocaleError {
    #[error("unsupported locale: {0}")]
    Unsupported(String),
}

/// Supported portal languages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Ar, Locale::En];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }

    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::Ar => Direction::Rtl,
            Self::En => Direction::Ltr,
        }
    }

    /// The other supported locale.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ar => Self::En,
            Self::En => Self::Ar,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" => Ok(Self::Ar),
            "en" => Ok(Self::En),
            _ => Err(LocaleError::Unsupported(s.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Rtl,
    Ltr,
}

impl Direction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rtl => "rtl",
            Self::Ltr => "ltr",
        }
    }
}

/// Locale plus its derived direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocaleState {
    pub locale: Locale,
    pub direction: Direction,
}

impl From<Locale> for LocaleState {
    fn from(locale: Locale) -> Self {
        Self { locale, direction: locale.direction() }
    }
}

/// Resolve a raw cookie value, falling back to `default` when absent or unrecognized.
#[must_use]
pub fn resolve_locale(cookie: Option<&str>, default: Locale) -> Locale {
    cookie.and_then(|raw| raw.parse().ok()).unwrap_or(default)
}

/// `Set-Cookie` / `document.cookie` string for `locale`.
#[must_use]
pub fn locale_cookie(locale: Locale) -> String {
    format!("{LOCALE_COOKIE}={}; path=/; max-age={LOCALE_COOKIE_MAX_AGE_SECS}; samesite=lax", locale.code())
}

/// Value of cookie `name` in a `Cookie` header / `document.cookie` string.
#[must_use]
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Cookie access for the current page.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    /// Write a full cookie string as produced by [`locale_cookie`].
    fn set(&self, cookie: &str);
}

/// Effects on the hosting page.
pub trait PageHost: Send + Sync {
    /// Set `lang` and `dir` on the root element.
    fn apply_locale(&self, lang: &str, direction: Direction);
    /// Full page reload.
    fn reload(&self);
}

/// Process-wide locale state for one page.
pub struct LocaleContext {
    cookies: Arc<dyn CookieJar>,
    host: Arc<dyn PageHost>,
    default: Locale,
    reload_on_change: bool,
    publisher: StatePublisher<LocaleState>,
}

impl LocaleContext {
    /// Resolve the initial state from the cookie.
    pub fn new(cookies: Arc<dyn CookieJar>, host: Arc<dyn PageHost>, default: Locale) -> Self {
        let initial = resolve_locale(cookies.get(LOCALE_COOKIE).as_deref(), default);
        Self {
            cookies,
            host,
            default,
            reload_on_change: true,
            publisher: StatePublisher::new(initial.into()),
        }
    }

    /// Choose between full reload (default) and in-place re-render on change.
    #[must_use]
    pub fn with_reload(mut self, reload_on_change: bool) -> Self {
        self.reload_on_change = reload_on_change;
        self
    }

    #[must_use]
    pub fn state(&self) -> LocaleState {
        self.publisher.current()
    }

    #[must_use]
    pub fn locale(&self) -> Locale {
        self.state().locale
    }

    #[must_use]
    pub fn subscribe(&self) -> StateSubscriber<LocaleState> {
        self.publisher.subscribe()
    }

    /// Re-read the cookie (mount) and apply its direction to the page.
    pub fn resync(&self) -> LocaleState {
        let locale = resolve_locale(self.cookies.get(LOCALE_COOKIE).as_deref(), self.default);
        let state = LocaleState::from(locale);
        self.host.apply_locale(locale.code(), state.direction);
        self.publisher.publish_if_changed(state);
        debug!(locale = %locale, "locale resynced from cookie");
        state
    }

    /// Validate and switch to `code`.
    ///
    /// # Errors
    ///
    /// Returns [`LocaleError::Unsupported`] for anything but `ar` / `en`;
    /// nothing is written in that case.
    pub fn set_locale(&self, code: &str) -> Result<LocaleState, LocaleError> {
        let locale = code.parse::<Locale>()?;
        Ok(self.set(locale))
    }

    /// Persist `locale`, update the page, then reload or publish.
    pub fn set(&self, locale: Locale) -> LocaleState {
        let state = LocaleState::from(locale);
        self.cookies.set(&locale_cookie(locale));
        self.host.apply_locale(locale.code(), state.direction);
        self.publisher.publish(state);
        info!(locale = %locale, reload = self.reload_on_change, "locale changed");
        if self.reload_on_change {
            self.host.reload();
        }
        state
    }

    /// Flip between the two supported locales.
    pub fn toggle_locale(&self) -> LocaleState {
        self.set(self.locale().toggled())
    }
}

impl fmt::Debug for LocaleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleContext")
            .field("state", &self.state())
            .field("reload_on_change", &self.reload_on_change)
            .finish_non_exhaustive()
    }
}
