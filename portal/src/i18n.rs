//! Translation bundles embedded at compile time.
//!
//! Lookups fall back to English, then to the key itself, so a missing
//! translation degrades to readable text instead of an empty label.

#[cfg(test)]
#[path = "i18n_test.rs"]
mod i18n_test;

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::debug;

use crate::locale::Locale;

type Bundle = HashMap<String, String>;

static EN: LazyLock<Bundle> = LazyLock::new(|| parse_bundle("en", include_str!("../messages/en.json")));
static AR: LazyLock<Bundle> = LazyLock::new(|| parse_bundle("ar", include_str!("../messages/ar.json")));

fn parse_bundle(name: &str, raw: &str) -> Bundle {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::error!(bundle = name, error = %e, "translation bundle is malformed");
        Bundle::new()
    })
}

fn bundle(locale: Locale) -> &'static Bundle {
    match locale {
        Locale::Ar => &AR,
        Locale::En => &EN,
    }
}

/// Translated string for `key` in `locale`.
#[must_use]
pub fn translate<'a>(locale: Locale, key: &'a str) -> &'a str {
    if let Some(text) = bundle(locale).get(key) {
        return text;
    }
    debug!(locale = %locale, key, "missing translation");
    EN.get(key).map_or(key, String::as_str)
}

/// Keys present in `locale`'s bundle, sorted.
#[must_use]
pub fn keys(locale: Locale) -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = bundle(locale).keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}
