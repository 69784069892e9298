//! `IntersectionObserver` wrapper for the progressive-load sentinel.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

/// Start loading slightly before the sentinel is actually on screen.
const ROOT_MARGIN: &str = "200px";

type EntriesCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// Observes one element and calls back whenever it enters the viewport.
/// Disconnects on drop.
pub struct ViewportObserver {
    observer: IntersectionObserver,
    _callback: EntriesCallback,
}

impl ViewportObserver {
    /// # Errors
    ///
    /// Returns the browser's error text if the observer cannot be created.
    pub fn observe(target: &Element, on_visible: impl Fn() + 'static) -> Result<Self, String> {
        let callback: EntriesCallback = Closure::new(move |entries: js_sys::Array, _: IntersectionObserver| {
            let visible = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .any(|entry| entry.is_intersecting());
            if visible {
                on_visible();
            }
        });
        let init = IntersectionObserverInit::new();
        init.set_root_margin(ROOT_MARGIN);
        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
            .map_err(|e| format!("{e:?}"))?;
        observer.observe(target);
        Ok(Self { observer, _callback: callback })
    }
}

impl Drop for ViewportObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
