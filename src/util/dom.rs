//! Browser glue: bootstrap lookup, cookies, scrolling and timers.
//!
//! Parsing helpers are pure so they run in native tests; the functions that
//! touch `document` or `window` are gated on the `csr` feature and degrade to
//! no-ops (or "not available") elsewhere.

#[cfg(test)]
#[path = "dom_test.rs"]
mod dom_test;

use std::time::Duration;

use crate::config::{Bootstrap, ConfigError};

/// Id of the `<script type="application/json">` element holding the bootstrap.
pub const BOOTSTRAP_ELEMENT_ID: &str = "dashboard-bootstrap";
pub const CSRF_COOKIE: &str = "csrftoken";

/// Value of cookie `name` in a `document.cookie` string.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_owned())
    })
}

/// Bootstrap for a page whose server render omitted the JSON block: no
/// sections yet, CSRF token from the cookie.
pub fn fallback_bootstrap(page: &str, cookies: &str) -> Bootstrap {
    let mut boot = Bootstrap::empty(page);
    boot.config.csrf_token = cookie_value(cookies, CSRF_COOKIE).unwrap_or_default();
    boot
}

/// Read and parse the embedded bootstrap document.
///
/// # Errors
///
/// `ConfigError::Parse` when the element is missing or its JSON is invalid.
pub fn read_bootstrap() -> Result<Bootstrap, ConfigError> {
    #[cfg(feature = "csr")]
    {
        let raw = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(BOOTSTRAP_ELEMENT_ID))
            .and_then(|el| el.text_content())
            .ok_or_else(|| ConfigError::Parse(format!("element #{BOOTSTRAP_ELEMENT_ID} not found")))?;
        Bootstrap::from_json(&raw)
    }
    #[cfg(not(feature = "csr"))]
    {
        Err(ConfigError::Parse("not available outside the browser".to_owned()))
    }
}

/// `document.cookie`, or empty outside the browser.
pub fn document_cookies() -> String {
    #[cfg(feature = "csr")]
    {
        use wasm_bindgen::JsCast;

        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<web_sys::HtmlDocument>().ok())
            .and_then(|d| d.cookie().ok())
            .unwrap_or_default()
    }
    #[cfg(not(feature = "csr"))]
    {
        String::new()
    }
}

/// Smooth-scroll the element with `dom_id` to the top of the viewport.
/// Returns whether the element exists.
pub fn scroll_into_view(dom_id: &str) -> bool {
    #[cfg(feature = "csr")]
    {
        let Some(element) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.get_element_by_id(dom_id))
        else {
            return false;
        };
        let options = web_sys::ScrollIntoViewOptions::new();
        options.set_behavior(web_sys::ScrollBehavior::Smooth);
        options.set_block(web_sys::ScrollLogicalPosition::Start);
        element.scroll_into_view_with_scroll_into_view_options(&options);
        true
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = dom_id;
        false
    }
}

/// Wait `duration` on the browser timer queue. Resolves immediately outside
/// the browser.
pub async fn sleep(duration: Duration) {
    #[cfg(feature = "csr")]
    {
        gloo_timers::future::sleep(duration).await;
    }
    #[cfg(not(feature = "csr"))]
    {
        let _ = duration;
    }
}
