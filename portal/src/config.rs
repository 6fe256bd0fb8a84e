//! Portal configuration parsed from `PORTAL_*` variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::locale::Locale;
use crate::unread::{DEFAULT_CHAT_COLLECTION, DEFAULT_NOTIFICATIONS_COLLECTION};

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_HOME_PATH: &str = "/";
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 10_000;
/// Firebase ID tokens live for an hour; refresh ten minutes early.
pub const DEFAULT_TOKEN_REFRESH_MS: u64 = 50 * 60 * 1_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// Firebase project settings used by the client adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub default_locale: Locale,
    pub login_path: String,
    pub home_path: String,
    pub auth_timeout_ms: u64,
    /// Interval at which the signed-in user's access token is re-fetched.
    pub token_refresh_ms: u64,
    pub chat_collection: String,
    /// May contain `{uid}`.
    pub notifications_collection: String,
    pub reload_on_locale_change: bool,
    pub firebase: FirebaseConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            default_locale: Locale::Ar,
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            home_path: DEFAULT_HOME_PATH.to_owned(),
            auth_timeout_ms: DEFAULT_AUTH_TIMEOUT_MS,
            token_refresh_ms: DEFAULT_TOKEN_REFRESH_MS,
            chat_collection: DEFAULT_CHAT_COLLECTION.to_owned(),
            notifications_collection: DEFAULT_NOTIFICATIONS_COLLECTION.to_owned(),
            reload_on_locale_change: true,
            firebase: FirebaseConfig { poll_interval_ms: DEFAULT_POLL_INTERVAL_MS, ..FirebaseConfig::default() },
        }
    }
}

impl PortalConfig {
    /// Build config from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`PortalConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup.
    ///
    /// All keys are optional:
    /// - `PORTAL_DEFAULT_LOCALE`: `ar` (default) or `en`
    /// - `PORTAL_LOGIN_PATH`, `PORTAL_HOME_PATH`
    /// - `PORTAL_AUTH_TIMEOUT_MS`: default 10000
    /// - `PORTAL_TOKEN_REFRESH_MS`: default 3000000, zero is ignored
    /// - `PORTAL_CHAT_COLLECTION`, `PORTAL_NOTIFICATIONS_COLLECTION`
    /// - `PORTAL_RELOAD_ON_LOCALE_CHANGE`: default true
    /// - `PORTAL_FIREBASE_API_KEY`, `PORTAL_FIREBASE_PROJECT_ID`
    /// - `PORTAL_FIREBASE_POLL_INTERVAL_MS`: default 5000
    ///
    /// # Errors
    ///
    /// Returns an error if `PORTAL_DEFAULT_LOCALE` is not a supported locale.
    /// Unparseable numbers and booleans fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let default_locale = match lookup("PORTAL_DEFAULT_LOCALE") {
            Some(raw) => raw.parse::<Locale>().map_err(|e| ConfigError::Parse(e.to_string()))?,
            None => defaults.default_locale,
        };

        Ok(Self {
            default_locale,
            login_path: lookup("PORTAL_LOGIN_PATH").unwrap_or(defaults.login_path),
            home_path: lookup("PORTAL_HOME_PATH").unwrap_or(defaults.home_path),
            auth_timeout_ms: parse_or(&lookup, "PORTAL_AUTH_TIMEOUT_MS", defaults.auth_timeout_ms),
            token_refresh_ms: match parse_or(&lookup, "PORTAL_TOKEN_REFRESH_MS", defaults.token_refresh_ms) {
                0 => defaults.token_refresh_ms,
                ms => ms,
            },
            chat_collection: lookup("PORTAL_CHAT_COLLECTION").unwrap_or(defaults.chat_collection),
            notifications_collection: lookup("PORTAL_NOTIFICATIONS_COLLECTION")
                .unwrap_or(defaults.notifications_collection),
            reload_on_locale_change: lookup("PORTAL_RELOAD_ON_LOCALE_CHANGE")
                .and_then(|raw| parse_bool(&raw))
                .unwrap_or(defaults.reload_on_locale_change),
            firebase: FirebaseConfig {
                api_key: lookup("PORTAL_FIREBASE_API_KEY").unwrap_or_default(),
                project_id: lookup("PORTAL_FIREBASE_PROJECT_ID").unwrap_or_default(),
                poll_interval_ms: parse_or(&lookup, "PORTAL_FIREBASE_POLL_INTERVAL_MS", defaults.firebase.poll_interval_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
