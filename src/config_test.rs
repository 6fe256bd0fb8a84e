use super::*;
use portal::locale::Locale;

#[test]
fn defaults_without_environment() {
    let cfg = HostConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg.port, DEFAULT_PORT);
    assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
    assert_eq!(cfg.portal, PortalConfig::default());
}

#[test]
fn port_and_portal_keys_are_read() {
    let cfg = HostConfig::from_lookup(|key| match key {
        "PORT" => Some("8080".to_owned()),
        "BIND_ADDR" => Some("127.0.0.1".to_owned()),
        "PORTAL_DEFAULT_LOCALE" => Some("en".to_owned()),
        _ => None,
    })
    .unwrap();
    assert_eq!(cfg.listen_addr(), "127.0.0.1:8080");
    assert_eq!(cfg.portal.default_locale, Locale::En);
}

#[test]
fn invalid_port_is_fatal() {
    let err = HostConfig::from_lookup(|key| (key == "PORT").then(|| "http".to_owned())).unwrap_err();
    assert_eq!(err.to_string(), "invalid PORT: http");
}

#[test]
fn invalid_portal_locale_is_fatal() {
    let err = HostConfig::from_lookup(|key| (key == "PORTAL_DEFAULT_LOCALE").then(|| "fr".to_owned())).unwrap_err();
    assert!(matches!(err, HostError::Portal(_)));
}
