use super::*;
use portal::locale::Locale;

#[test]
fn tr_follows_signal() {
    let locale = RwSignal::new(LocaleState::from(Locale::En));
    let title = tr(locale, "app.title");
    assert_eq!(title(), "Merchant Portal");

    locale.set(LocaleState::from(Locale::Ar));
    assert_ne!(title(), "Merchant Portal");
    assert!(!title().is_empty());
}

#[test]
fn tr_falls_back_to_key() {
    let locale = RwSignal::new(LocaleState::from(Locale::En));
    assert_eq!(tr(locale, "no.such.key")(), "no.such.key");
}

#[test]
fn dir_tracks_locale() {
    let locale = RwSignal::new(LocaleState::from(Locale::Ar));
    let direction = dir(locale);
    assert_eq!(direction(), "rtl");
    locale.set(LocaleState::from(Locale::En));
    assert_eq!(direction(), "ltr");
}
