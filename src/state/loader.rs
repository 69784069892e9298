//! Progressive section loading.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page ships with the first few sections; the rest arrive in batches as
//! a sentinel element below the last card scrolls into view. This module owns
//! the load cursor and the `{Idle, Loading} x {HasMore, Exhausted}` state
//! machine. The viewport observer itself lives in the presentation layer and
//! is detached once [`LoaderState::observer_attached`] turns false.
//!
//! ERROR HANDLING
//! ==============
//! A failed batch returns to `Idle` with the cursor unchanged and the message
//! kept in `last_error`; the next visibility event or a manual retry tries
//! again. There is no automatic backoff.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::cell::RefCell;
use std::rc::Rc;

use super::sections::SectionStore;
use crate::config::Tunables;
use crate::error::GatewayError;
use crate::net::gateway::Gateway;
use crate::net::types::LoadMoreBody;
use crate::util::cancel::{CancelSlot, CancelToken};
use crate::util::notify::Notifier;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
}

/// Position of the next batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadCursor {
    /// Index of the first section not yet delivered.
    pub next_section_index: usize,
    /// False once the server reported the last batch.
    pub has_more: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderState {
    pub phase: LoadPhase,
    pub cursor: LoadCursor,
    /// Whether the viewport sentinel should stay observed.
    pub observer_attached: bool,
    /// Message of the last failed batch, until dismissed or retried.
    pub last_error: Option<String>,
    auto_triggered: bool,
}

impl LoaderState {
    pub fn is_exhausted(&self) -> bool {
        !self.cursor.has_more
    }
}

#[derive(Clone)]
pub struct ProgressiveSectionLoader {
    store: SectionStore,
    gateway: Rc<dyn Gateway>,
    tunables: Tunables,
    state: Rc<RefCell<LoaderState>>,
    cancel: CancelSlot,
    notifier: Notifier,
}

impl ProgressiveSectionLoader {
    pub fn new(store: SectionStore, gateway: Rc<dyn Gateway>, cursor: LoadCursor, tunables: Tunables) -> Self {
        let notifier = store.notifier();
        let state = LoaderState {
            phase: LoadPhase::Idle,
            cursor,
            observer_attached: cursor.has_more,
            last_error: None,
            auto_triggered: false,
        };
        Self { store, gateway, tunables, state: Rc::new(RefCell::new(state)), cancel: CancelSlot::new(), notifier }
    }

    pub fn state(&self) -> LoaderState {
        self.state.borrow().clone()
    }

    pub fn cursor(&self) -> LoadCursor {
        self.state.borrow().cursor
    }

    /// True when the bootstrap delivered fewer sections than the auto-load
    /// threshold and the one-off self-trigger has not run yet.
    pub fn wants_auto_load(&self) -> bool {
        let state = self.state.borrow();
        !state.auto_triggered
            && state.cursor.has_more
            && state.cursor.next_section_index < self.tunables.auto_load_threshold
    }

    /// Run the one-off bootstrap cycle. Returns whether a batch was fetched.
    pub async fn auto_load(&self) -> bool {
        if !self.wants_auto_load() {
            return false;
        }
        self.state.borrow_mut().auto_triggered = true;
        log::debug!("auto-loading sections after sparse bootstrap");
        self.load_more().await
    }

    /// Fetch the next batch. A no-op while a batch is in flight or once the
    /// collection is exhausted. Returns whether a batch was fetched.
    pub async fn load_more(&self) -> bool {
        let Some((start, token)) = self.begin() else {
            return false;
        };
        let result = self.gateway.load_more(start).await;
        if token.is_cancelled() {
            log::debug!("load-more from {start} abandoned");
            return false;
        }
        self.complete(start, result);
        true
    }

    /// Abandon an in-flight batch; its result is ignored.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let changed = {
            let mut state = self.state.borrow_mut();
            let was_loading = state.phase == LoadPhase::Loading;
            state.phase = LoadPhase::Idle;
            was_loading
        };
        if changed {
            self.notifier.notify();
        }
    }

    pub fn dismiss_error(&self) {
        if self.state.borrow_mut().last_error.take().is_some() {
            self.notifier.notify();
        }
    }

    fn begin(&self) -> Option<(usize, CancelToken)> {
        let start = {
            let mut state = self.state.borrow_mut();
            if state.phase == LoadPhase::Loading {
                log::debug!("load-more already in flight");
                return None;
            }
            if state.is_exhausted() {
                return None;
            }
            state.phase = LoadPhase::Loading;
            state.last_error = None;
            state.cursor.next_section_index
        };
        let token = self.cancel.issue();
        log::debug!("loading sections from index {start}");
        self.notifier.notify();
        Some((start, token))
    }

    fn complete(&self, start: usize, result: Result<LoadMoreBody, GatewayError>) {
        match result {
            Ok(body) => {
                let delivered = body.sections.len();
                for (name, payload) in body.sections {
                    self.store.register_payload(&name, payload);
                }
                let advanced = body.next_index.max(start + delivered);
                let progressed = advanced > start;
                if body.has_more && !progressed {
                    log::warn!("load-more from {start} made no progress; treating sections as exhausted");
                }
                {
                    let mut state = self.state.borrow_mut();
                    state.phase = LoadPhase::Idle;
                    state.cursor.next_section_index = advanced.max(state.cursor.next_section_index);
                    state.cursor.has_more = body.has_more && progressed;
                    if !state.cursor.has_more {
                        state.observer_attached = false;
                    }
                }
                log::debug!("loaded {delivered} section(s); next index {advanced}, more: {}", body.has_more && progressed);
            }
            Err(err) => {
                log::warn!("load-more from {start} failed: {err}");
                let mut state = self.state.borrow_mut();
                state.phase = LoadPhase::Idle;
                state.last_error = Some(err.to_string());
            }
        }
        self.notifier.notify();
    }
}
