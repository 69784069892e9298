//! Debounced dashboard-wide search.
//!
//! SYSTEM CONTEXT
//! ==============
//! The header search box feeds every keystroke into [`SearchOrchestrator::input`],
//! which returns a debounce ticket. The presentation layer sleeps for the
//! debounce window and then calls `fire` with that ticket; only the newest
//! ticket reaches the gateway.
//!
//! DESIGN
//! ======
//! At most one request is in flight. A query that fires while another is
//! outstanding is parked (newest wins) and issued when the outstanding one
//! completes. Every response carries the query it answers and is dropped if
//! the input has changed since, so the panel never shows results for an older
//! query than the one typed.

#[cfg(test)]
#[path = "search_test.rs"]
mod search_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::sections::{LoadStatus, Section, SectionLoadState, SectionStore, section_dom_id, section_key};
use crate::config::Tunables;
use crate::error::GatewayError;
use crate::net::gateway::Gateway;
use crate::net::types::{Record, SearchBody, SectionConfig};
use crate::util::cancel::CancelSlot;
use crate::util::notify::Notifier;

const DETAIL_SEPARATOR: &str = " \u{2022} ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchPhase {
    /// Nothing to show (no query, or below the length floor).
    #[default]
    Idle,
    Searching,
    Results,
    /// The server found nothing.
    Empty,
    Failed,
}

/// Matches of one section, in server order.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchGroup {
    pub section: String,
    pub config: SectionConfig,
    pub rows: Vec<Record>,
    /// Total matches; may exceed `rows.len()`.
    pub count: u64,
}

/// One rendered search hit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewRow {
    pub pk: String,
    pub title: String,
    /// `Label: value` pairs of the next columns, joined with a bullet.
    pub details: String,
}

impl SearchGroup {
    /// The first `limit` rows as preview lines.
    pub fn preview(&self, limit: usize) -> Vec<PreviewRow> {
        self.rows.iter().take(limit).map(|record| preview_row(&self.config, record)).collect()
    }

    /// Total match count when it exceeds what the preview shows.
    pub fn overflow(&self, limit: usize) -> Option<u64> {
        (self.count > limit as u64).then_some(self.count)
    }

    pub fn dom_id(&self) -> String {
        section_dom_id(&self.section)
    }
}

/// Title from the first column (falling back to the primary key), details from
/// the next two non-empty columns.
pub fn preview_row(config: &SectionConfig, record: &Record) -> PreviewRow {
    let title = config
        .columns
        .first()
        .and_then(|column| record.display_value(&column.db_column))
        .unwrap_or_else(|| record.pk.clone());
    let details = config
        .columns
        .iter()
        .skip(1)
        .take(2)
        .filter_map(|column| {
            record.display_value(&column.db_column).map(|value| format!("{}: {value}", column.display_name))
        })
        .collect::<Vec<_>>()
        .join(DETAIL_SEPARATOR);
    PreviewRow { pk: record.pk.clone(), title, details }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchState {
    /// Raw text of the search box.
    pub query: String,
    pub visible: bool,
    pub phase: SearchPhase,
    pub groups: Vec<SearchGroup>,
    /// Query the displayed groups answer.
    pub answered: Option<String>,
    pub error: Option<String>,
    /// Section and record chosen from the results, highlighted in its card.
    pub highlight: Option<(String, String)>,
}

impl SearchState {
    pub fn total_matches(&self) -> u64 {
        self.groups.iter().map(|group| group.count).sum()
    }

    fn clear_results(&mut self) {
        self.phase = SearchPhase::Idle;
        self.groups.clear();
        self.answered = None;
        self.error = None;
    }
}

/// Identifies one debounce window; only the newest ticket may fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceTicket(u64);

#[derive(Clone)]
pub struct SearchOrchestrator {
    store: SectionStore,
    gateway: Rc<dyn Gateway>,
    tunables: Tunables,
    state: Rc<RefCell<SearchState>>,
    ticket: Rc<Cell<u64>>,
    /// Query of the outstanding request.
    in_flight: Rc<RefCell<Option<String>>>,
    parked: Rc<RefCell<Option<String>>>,
    cancel: CancelSlot,
    notifier: Notifier,
}

impl SearchOrchestrator {
    pub fn new(store: SectionStore, gateway: Rc<dyn Gateway>, tunables: Tunables) -> Self {
        let notifier = store.notifier();
        Self {
            store,
            gateway,
            tunables,
            state: Rc::new(RefCell::new(SearchState::default())),
            ticket: Rc::new(Cell::new(0)),
            in_flight: Rc::new(RefCell::new(None)),
            parked: Rc::new(RefCell::new(None)),
            cancel: CancelSlot::new(),
            notifier,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn preview_limit(&self) -> usize {
        self.tunables.search_preview_limit
    }

    /// Record a keystroke. Returns a ticket to fire after the debounce window,
    /// or `None` when the query is too short to search.
    pub fn input(&self, text: &str) -> Option<DebounceTicket> {
        let ticket = self.next_ticket();
        let searchable = {
            let mut state = self.state.borrow_mut();
            state.query = text.to_owned();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                state.clear_results();
                state.visible = false;
                false
            } else if trimmed.chars().count() < self.tunables.min_query_len {
                state.clear_results();
                false
            } else {
                true
            }
        };
        self.notifier.notify();
        searchable.then_some(ticket)
    }

    /// Run the search for `ticket` if no newer keystroke superseded it.
    pub async fn fire(&self, ticket: DebounceTicket) {
        if ticket.0 != self.ticket.get() {
            return;
        }
        if let Some(query) = self.searchable_query() {
            self.run(query).await;
        }
    }

    /// Search immediately (Enter key or search button), skipping the
    /// debounce but not the length floor.
    pub async fn search_now(&self) {
        self.next_ticket();
        if let Some(query) = self.searchable_query() {
            self.run(query).await;
        }
    }

    /// Hide the panel, keeping the query and results for a cheap re-open.
    pub fn dismiss(&self) {
        let changed = std::mem::replace(&mut self.state.borrow_mut().visible, false);
        if changed {
            self.notifier.notify();
        }
    }

    /// Re-show the panel when it has something to show.
    pub fn reveal(&self) {
        let changed = {
            let mut state = self.state.borrow_mut();
            let show = !state.query.trim().is_empty() && state.phase != SearchPhase::Idle;
            let changed = show && !state.visible;
            state.visible |= show;
            changed
        };
        if changed {
            self.notifier.notify();
        }
    }

    /// Reset query and results, cancel the pending debounce and drop any
    /// outstanding response.
    pub fn clear(&self) {
        self.next_ticket();
        self.cancel.cancel();
        self.parked.borrow_mut().take();
        {
            let mut state = self.state.borrow_mut();
            state.query.clear();
            state.visible = false;
            state.highlight = None;
            state.clear_results();
        }
        self.notifier.notify();
    }

    /// Bring a result's section into the store (registering it from the
    /// search configuration when it is not known yet), highlight `record_pk`
    /// and hide the panel. Returns the section's DOM id.
    pub fn locate(&self, section: &str, record_pk: Option<&str>) -> Option<String> {
        if !self.store.contains(section) {
            let config = {
                let state = self.state.borrow();
                let key = section_key(section);
                state.groups.iter().find(|group| section_key(&group.section) == key).map(|group| group.config.clone())
            };
            let Some(config) = config else {
                log::warn!("cannot locate unknown section {section}");
                return None;
            };
            log::debug!("registering {section} from search results");
            self.store.register(Section::from_config(section, config), SectionLoadState::not_loaded());
        }
        {
            let mut state = self.state.borrow_mut();
            state.highlight = record_pk.map(|pk| (section.to_owned(), pk.to_owned()));
            state.visible = false;
        }
        self.notifier.notify();
        Some(section_dom_id(section))
    }

    /// Whether `section` has rows to scroll to, as opposed to a placeholder.
    pub fn is_section_loaded(&self, section: &str) -> bool {
        self.store.get(section).is_ok_and(|state| state.status == LoadStatus::Loaded)
    }

    fn next_ticket(&self) -> DebounceTicket {
        let next = self.ticket.get().wrapping_add(1);
        self.ticket.set(next);
        DebounceTicket(next)
    }

    fn searchable_query(&self) -> Option<String> {
        let state = self.state.borrow();
        let trimmed = state.query.trim();
        (trimmed.chars().count() >= self.tunables.min_query_len).then(|| trimmed.to_owned())
    }

    fn is_current(&self, query: &str) -> bool {
        self.state.borrow().query.trim() == query
    }

    async fn run(&self, query: String) {
        let outstanding = self.in_flight.borrow().clone();
        if let Some(outstanding) = outstanding {
            if outstanding == query {
                // The outstanding answer will be current again.
                log::debug!("search for {query:?} already in flight");
                self.parked.borrow_mut().take();
            } else {
                log::debug!("search in flight; parking {query:?}");
                *self.parked.borrow_mut() = Some(query);
            }
            return;
        }

        let mut next = Some(query);
        while let Some(query) = next.take() {
            *self.in_flight.borrow_mut() = Some(query.clone());
            let token = self.cancel.issue();
            {
                let mut state = self.state.borrow_mut();
                state.phase = SearchPhase::Searching;
                state.visible = true;
                state.error = None;
            }
            self.notifier.notify();

            let result = self.gateway.search(&query).await;
            self.in_flight.borrow_mut().take();

            if token.is_cancelled() {
                log::debug!("search for {query:?} abandoned");
            } else if !self.is_current(&query) {
                log::debug!("dropping stale results for {query:?}");
            } else {
                self.apply(&query, result);
            }

            next = self.parked.borrow_mut().take().filter(|parked| self.is_current(parked));
        }
    }

    fn apply(&self, query: &str, result: Result<SearchBody, GatewayError>) {
        {
            let mut state = self.state.borrow_mut();
            state.answered = Some(query.to_owned());
            match result {
                Ok(body) => {
                    state.groups = body
                        .results
                        .into_iter()
                        .map(|(section, hit)| {
                            let count = hit.count.max(hit.data.len() as u64);
                            SearchGroup { section, config: hit.config, rows: hit.data, count }
                        })
                        .collect();
                    state.phase = if state.groups.is_empty() { SearchPhase::Empty } else { SearchPhase::Results };
                    state.error = None;
                }
                Err(err) => {
                    log::warn!("search for {query:?} failed: {err}");
                    state.groups.clear();
                    state.phase = SearchPhase::Failed;
                    state.error = Some(err.to_string());
                }
            }
        }
        self.notifier.notify();
    }
}
