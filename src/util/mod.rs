//! Utility helpers shared across the dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! `cancel` and `notify` are plain core helpers. `dom` and `viewport` isolate
//! browser concerns from page and component logic.

pub mod cancel;
pub mod dom;
pub mod notify;
#[cfg(feature = "csr")]
pub mod viewport;
