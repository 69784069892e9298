//! Client-side data orchestration for a multi-section admin dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server renders a page shell with an embedded bootstrap (page config,
//! first sections, load cursor). This crate mounts into that shell and owns
//! everything after: progressive section loading, cross-section search,
//! schema-driven add/edit forms and paginated "view all" tables.
//!
//! The state layer (`state`, `dashboard`) is plain `Rc`-based Rust with no
//! Leptos types so it can be driven and tested natively; `app`, `pages` and
//! `components` bridge it into reactive views.

pub mod app;
pub mod components;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

#[cfg(test)]
mod testing;

/// WASM entry point.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Debug) {
        leptos::logging::warn!("console logger already installed: {err}");
    }
    leptos::mount::mount_to_body(app::App);
}
