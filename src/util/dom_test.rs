use super::*;

#[test]
fn cookie_value_finds_named_cookie() {
    let cookies = "sessionid=abc; csrftoken=tok123 ; theme=dark";
    assert_eq!(cookie_value(cookies, "csrftoken").as_deref(), Some("tok123"));
    assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
    assert_eq!(cookie_value(cookies, "missing"), None);
}

#[test]
fn cookie_value_ignores_malformed_pairs() {
    assert_eq!(cookie_value("garbage; csrftoken=x", "csrftoken").as_deref(), Some("x"));
    assert_eq!(cookie_value("", "csrftoken"), None);
}

#[test]
fn fallback_bootstrap_starts_empty_with_cookie_token() {
    let boot = fallback_bootstrap("Catalog", "csrftoken=tok");
    assert_eq!(boot.config.page, "Catalog");
    assert_eq!(boot.config.csrf_token, "tok");
    assert_eq!(boot.next_section_index, 0);
    assert!(boot.has_more_sections);
}

#[cfg(not(feature = "csr"))]
#[test]
fn browser_helpers_degrade_natively() {
    assert!(read_bootstrap().is_err());
    assert_eq!(document_cookies(), "");
    assert!(!scroll_into_view("section-x"));
    futures::executor::block_on(sleep(Duration::from_secs(5)));
}
