//! Locale state and reactive translation.

#[cfg(test)]
#[path = "locale_test.rs"]
mod locale_test;

use leptos::prelude::*;
use portal::i18n::translate;
use portal::locale::LocaleState;

/// Context type for the mirrored locale state.
pub type LocaleSignal = RwSignal<LocaleState>;

/// Reactive text for `key` that re-resolves when the locale changes.
pub fn tr(locale: LocaleSignal, key: &'static str) -> impl Fn() -> String + Copy + Send + Sync + 'static {
    move || translate(locale.get().locale, key).to_owned()
}

/// `ltr` / `rtl` for the current locale, for `dir` attributes.
pub fn dir(locale: LocaleSignal) -> impl Fn() -> &'static str + Copy + Send + Sync + 'static {
    move || locale.get().direction.as_str()
}
