//! Paginated "view all" drill-down for one section.
//!
//! Every page change re-fetches; pages are never cached client-side. The
//! fetched page also becomes the section's current rows in the store.

#[cfg(test)]
#[path = "paginator_test.rs"]
mod paginator_test;

use std::cell::RefCell;
use std::rc::Rc;

use super::sections::{Section, SectionLoadState, SectionStore, section_key};
use crate::config::Tunables;
use crate::net::gateway::Gateway;
use crate::net::types::{Column, Pagination, Record};
use crate::util::cancel::CancelSlot;
use crate::util::notify::Notifier;

/// Page numbers to render around `current`: at most `window` entries centred
/// on it, clamped to `[1, total]`.
pub fn page_window(current: u32, total: u32, window: u32) -> Vec<u32> {
    if total == 0 || window == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total);
    let half = window / 2;
    let start = current.saturating_sub(half).max(1);
    let end = current.saturating_add(window - 1 - half).min(total);
    (start..=end).collect()
}

/// Navigation affordances derived from a cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageControls {
    pub previous: Option<u32>,
    pub next: Option<u32>,
    pub pages: Vec<u32>,
    pub current: u32,
}

impl PageControls {
    /// `None` when there is a single page (or none).
    pub fn from_cursor(cursor: &Pagination, window: u32) -> Option<Self> {
        if cursor.total_pages <= 1 {
            return None;
        }
        let current = cursor.current_page;
        Some(Self {
            previous: (cursor.has_previous && current > 1).then(|| current - 1),
            next: (cursor.has_next && current < cursor.total_pages).then(|| current + 1),
            pages: page_window(current, cursor.total_pages, window),
            current,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ViewAllPhase {
    Loading,
    Loaded,
    /// The page came back without records.
    Empty,
    Failed(String),
}

/// Contents of the view-all modal.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewAllState {
    pub section: String,
    pub requested_page: u32,
    pub phase: ViewAllPhase,
    pub columns: Vec<Column>,
    pub rows: Vec<Record>,
    pub cursor: Option<Pagination>,
    pub supports_edit: bool,
}

impl ViewAllState {
    fn loading(section: &str, page: u32, previous: Option<&ViewAllState>) -> Self {
        Self {
            section: section.to_owned(),
            requested_page: page,
            phase: ViewAllPhase::Loading,
            columns: previous.map(|p| p.columns.clone()).unwrap_or_default(),
            rows: Vec::new(),
            cursor: None,
            supports_edit: previous.is_some_and(|p| p.supports_edit),
        }
    }

    pub fn controls(&self, window: u32) -> Option<PageControls> {
        self.cursor.as_ref().and_then(|cursor| PageControls::from_cursor(cursor, window))
    }
}

#[derive(Clone)]
pub struct ViewAllPaginator {
    store: SectionStore,
    gateway: Rc<dyn Gateway>,
    tunables: Tunables,
    state: Rc<RefCell<Option<ViewAllState>>>,
    cancel: CancelSlot,
    notifier: Notifier,
}

impl ViewAllPaginator {
    pub fn new(store: SectionStore, gateway: Rc<dyn Gateway>, tunables: Tunables) -> Self {
        let notifier = store.notifier();
        Self { store, gateway, tunables, state: Rc::new(RefCell::new(None)), cancel: CancelSlot::new(), notifier }
    }

    pub fn state(&self) -> Option<ViewAllState> {
        self.state.borrow().clone()
    }

    pub fn page_window(&self) -> u32 {
        self.tunables.page_window
    }

    /// Fetch page `page` of `section` and replace the modal body.
    pub async fn open(&self, section: &str, page: u32) {
        let page = page.max(1);
        let token = self.cancel.issue();
        {
            let mut slot = self.state.borrow_mut();
            let previous = slot.as_ref().filter(|s| s.section == section);
            let mut next = ViewAllState::loading(section, page, previous);
            if let Ok(known) = self.store.section(section) {
                next.columns = known.columns;
                next.supports_edit = known.supports_edit;
            }
            *slot = Some(next);
        }
        self.notifier.notify();
        log::debug!("fetching {section} page {page}");

        let result = self.gateway.fetch_page(section, page).await;
        if token.is_cancelled() {
            return;
        }

        match result {
            Ok(body) => {
                let total = body
                    .pagination
                    .and_then(|p| p.total_count)
                    .unwrap_or(body.data.len() as u64);
                if !self.store.contains(section) {
                    self.store.register(Section::from_config(section, body.config.clone()), SectionLoadState::not_loaded());
                }
                if let Err(err) = self.store.replace_rows(section, body.data.clone(), total) {
                    log::debug!("paged section vanished: {err}");
                }
                let mut slot = self.state.borrow_mut();
                if let Some(view) = slot.as_mut() {
                    if !body.config.columns.is_empty() {
                        view.columns = body.config.columns;
                    }
                    view.supports_edit |= body.config.edit_button;
                    view.phase = if body.data.is_empty() { ViewAllPhase::Empty } else { ViewAllPhase::Loaded };
                    view.rows = body.data;
                    view.cursor = body.pagination;
                }
            }
            Err(err) => {
                log::warn!("view-all fetch for {section} page {page} failed: {err}");
                if let Some(view) = self.state.borrow_mut().as_mut() {
                    view.phase = ViewAllPhase::Failed(err.to_string());
                }
            }
        }
        self.notifier.notify();
    }

    /// Re-fetch the page currently shown (or last requested).
    pub async fn reload(&self) {
        let target = self.state.borrow().as_ref().map(|s| (s.section.clone(), s.requested_page));
        if let Some((section, page)) = target {
            self.open(&section, page).await;
        }
    }

    /// Reload when the modal is showing `section`. Returns whether it was.
    pub async fn reload_section(&self, section: &str) -> bool {
        let showing = self.state.borrow().as_ref().is_some_and(|s| section_key(&s.section) == section_key(section));
        if showing {
            self.reload().await;
        }
        showing
    }

    pub fn close(&self) {
        self.cancel.cancel();
        if self.state.borrow_mut().take().is_some() {
            self.notifier.notify();
        }
    }
}
