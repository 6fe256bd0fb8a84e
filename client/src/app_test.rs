use super::*;
use futures::StreamExt;
use futures::executor::block_on;
use portal::config::FirebaseConfig;
use portal::identity::IdentityProvider;
use portal::locale::{Direction, Locale, PageHost};
use portal::storage::MemoryStorage;
use std::sync::Mutex;

#[derive(Default)]
struct RecordingPage {
    applied: Mutex<Vec<(String, Direction)>>,
}

impl PageHost for RecordingPage {
    fn apply_locale(&self, lang: &str, direction: Direction) {
        self.applied.lock().unwrap().push((lang.to_owned(), direction));
    }

    fn reload(&self) {}
}

#[test]
fn resume_applies_cookie_locale_and_publishes_auth_state() {
    let page = Arc::new(RecordingPage::default());
    let cookies = Arc::new(RequestCookies::new(Some("NEXT_LOCALE=en".to_owned())));
    let locale = LocaleContext::new(cookies, page.clone(), Locale::Ar);
    let identity = FirebaseIdentity::new(&FirebaseConfig::default(), Arc::new(MemoryStorage::new()));
    let mut events = identity.auth_state_changes();

    resume_in_browser(&identity, &locale);

    assert_eq!(*page.applied.lock().unwrap(), vec![("en".to_owned(), Direction::Ltr)]);
    assert_eq!(locale.locale(), Locale::En);
    assert_eq!(block_on(events.next()), Some(None));
}
