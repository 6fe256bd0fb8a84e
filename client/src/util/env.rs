//! Portal configuration for the browser bundle.
//!
//! The WASM build has no process environment, so `PORTAL_*` keys are baked
//! in at compile time. Server rendering also consults the runtime
//! environment first, so the SSR host and the bundle agree when both are
//! built and started with the same variables.

#[cfg(test)]
#[path = "env_test.rs"]
mod env_test;

use portal::config::PortalConfig;
use tracing::warn;

/// Compile-time value of a `PORTAL_*` key.
pub fn build_time_value(key: &str) -> Option<&'static str> {
    match key {
        "PORTAL_DEFAULT_LOCALE" => option_env!("PORTAL_DEFAULT_LOCALE"),
        "PORTAL_LOGIN_PATH" => option_env!("PORTAL_LOGIN_PATH"),
        "PORTAL_HOME_PATH" => option_env!("PORTAL_HOME_PATH"),
        "PORTAL_AUTH_TIMEOUT_MS" => option_env!("PORTAL_AUTH_TIMEOUT_MS"),
        "PORTAL_TOKEN_REFRESH_MS" => option_env!("PORTAL_TOKEN_REFRESH_MS"),
        "PORTAL_CHAT_COLLECTION" => option_env!("PORTAL_CHAT_COLLECTION"),
        "PORTAL_NOTIFICATIONS_COLLECTION" => option_env!("PORTAL_NOTIFICATIONS_COLLECTION"),
        "PORTAL_RELOAD_ON_LOCALE_CHANGE" => option_env!("PORTAL_RELOAD_ON_LOCALE_CHANGE"),
        "PORTAL_FIREBASE_API_KEY" => option_env!("PORTAL_FIREBASE_API_KEY"),
        "PORTAL_FIREBASE_PROJECT_ID" => option_env!("PORTAL_FIREBASE_PROJECT_ID"),
        "PORTAL_FIREBASE_POLL_INTERVAL_MS" => option_env!("PORTAL_FIREBASE_POLL_INTERVAL_MS"),
        _ => None,
    }
}

fn lookup(key: &str) -> Option<String> {
    #[cfg(feature = "ssr")]
    {
        if let Ok(value) = std::env::var(key) {
            return Some(value);
        }
    }
    build_time_value(key).map(str::to_owned)
}

/// Load the portal config, falling back to defaults on a bad value.
pub fn load_config() -> PortalConfig {
    PortalConfig::from_lookup(lookup).unwrap_or_else(|e| {
        warn!(error = %e, "portal config invalid; using defaults");
        PortalConfig::default()
    })
}
