use super::*;
use std::sync::Mutex;

// =============================================================
// Fakes
// =============================================================

#[derive(Default)]
struct FakeCookies {
    header: Mutex<String>,
    writes: Mutex<Vec<String>>,
}

impl FakeCookies {
    fn with(header: &str) -> Self {
        Self { header: Mutex::new(header.to_owned()), writes: Mutex::default() }
    }
}

impl CookieJar for FakeCookies {
    fn get(&self, name: &str) -> Option<String> {
        cookie_value(&self.header.lock().unwrap(), name).map(str::to_owned)
    }

    fn set(&self, cookie: &str) {
        self.writes.lock().unwrap().push(cookie.to_owned());
        let pair = cookie.split(';').next().unwrap_or_default().to_owned();
        *self.header.lock().unwrap() = pair;
    }
}

#[derive(Default)]
struct FakeHost {
    applied: Mutex<Vec<(String, Direction)>>,
    reloads: Mutex<u32>,
}

impl PageHost for FakeHost {
    fn apply_locale(&self, lang: &str, direction: Direction) {
        self.applied.lock().unwrap().push((lang.to_owned(), direction));
    }

    fn reload(&self) {
        *self.reloads.lock().unwrap() += 1;
    }
}

fn context(header: &str, default: Locale) -> (Arc<FakeCookies>, Arc<FakeHost>, LocaleContext) {
    let cookies = Arc::new(FakeCookies::with(header));
    let host = Arc::new(FakeHost::default());
    let ctx = LocaleContext::new(cookies.clone(), host.clone(), default);
    (cookies, host, ctx)
}

// =============================================================
// Locale / Direction
// =============================================================

#[test]
fn direction_is_function_of_locale() {
    assert_eq!(Locale::Ar.direction(), Direction::Rtl);
    assert_eq!(Locale::En.direction(), Direction::Ltr);
    assert_eq!(LocaleState::from(Locale::Ar).direction.as_str(), "rtl");
}

#[test]
fn parse_accepts_supported_codes_only() {
    assert_eq!("ar".parse::<Locale>(), Ok(Locale::Ar));
    assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
    assert_eq!("fr".parse::<Locale>(), Err(LocaleError::Unsupported("fr".into())));
}

#[test]
fn resolve_falls_back_to_default() {
    assert_eq!(resolve_locale(None, Locale::Ar), Locale::Ar);
    assert_eq!(resolve_locale(Some("xx"), Locale::En), Locale::En);
    assert_eq!(resolve_locale(Some("en"), Locale::Ar), Locale::En);
}

// =============================================================
// Cookies
// =============================================================

#[test]
fn locale_cookie_has_path_and_one_year_max_age() {
    assert_eq!(locale_cookie(Locale::En), "NEXT_LOCALE=en; path=/; max-age=31536000; samesite=lax");
}

#[test]
fn cookie_value_finds_named_pair() {
    let header = "theme=dark; NEXT_LOCALE=ar ; other=1";
    assert_eq!(cookie_value(header, "NEXT_LOCALE"), Some("ar"));
    assert_eq!(cookie_value(header, "missing"), None);
    assert_eq!(cookie_value("", "NEXT_LOCALE"), None);
}

// =============================================================
// LocaleContext
// =============================================================

#[test]
fn initial_state_comes_from_cookie() {
    let (_, _, ctx) = context("NEXT_LOCALE=en", Locale::Ar);
    assert_eq!(ctx.state(), LocaleState::from(Locale::En));
}

#[test]
fn unrecognized_cookie_uses_default() {
    let (_, _, ctx) = context("NEXT_LOCALE=de", Locale::Ar);
    assert_eq!(ctx.locale(), Locale::Ar);
}

#[test]
fn set_locale_writes_cookie_applies_direction_and_reloads() {
    let (cookies, host, ctx) = context("", Locale::Ar);
    let state = ctx.set_locale("en").unwrap();
    assert_eq!(state, LocaleState::from(Locale::En));
    assert_eq!(cookies.writes.lock().unwrap().as_slice(), [locale_cookie(Locale::En)]);
    assert_eq!(host.applied.lock().unwrap().as_slice(), [("en".to_owned(), Direction::Ltr)]);
    assert_eq!(*host.reloads.lock().unwrap(), 1);
}

#[test]
fn set_locale_rejects_unsupported_without_side_effects() {
    let (cookies, host, ctx) = context("", Locale::Ar);
    assert!(ctx.set_locale("fr").is_err());
    assert!(cookies.writes.lock().unwrap().is_empty());
    assert_eq!(*host.reloads.lock().unwrap(), 0);
    assert_eq!(ctx.locale(), Locale::Ar);
}

#[test]
fn double_toggle_restores_original_locale() {
    let (_, host, ctx) = context("NEXT_LOCALE=ar", Locale::En);
    let first = ctx.toggle_locale();
    assert_eq!(first, LocaleState { locale: Locale::En, direction: Direction::Ltr });
    let second = ctx.toggle_locale();
    assert_eq!(second, LocaleState { locale: Locale::Ar, direction: Direction::Rtl });
    assert_eq!(*host.reloads.lock().unwrap(), 2);
}

#[test]
fn disabled_reload_publishes_in_place() {
    let (_, host, ctx) = context("", Locale::Ar);
    let ctx = ctx.with_reload(false);
    let sub = ctx.subscribe();
    ctx.toggle_locale();
    assert_eq!(sub.current().locale, Locale::En);
    assert_eq!(*host.reloads.lock().unwrap(), 0);
}

#[test]
fn resync_rereads_cookie() {
    let (cookies, _, ctx) = context("NEXT_LOCALE=ar", Locale::Ar);
    *cookies.header.lock().unwrap() = "NEXT_LOCALE=en".to_owned();
    assert_eq!(ctx.resync().locale, Locale::En);
    assert_eq!(ctx.locale(), Locale::En);
}
