//! Registry of every section known to the page.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store is the single source of truth for section identity, load status
//! and cached rows. The loader, the record editor and the paginator mutate it;
//! the presentation layer subscribes to change notifications and re-renders
//! from it. It also owns the per-section field schema cache.
//!
//! ERROR HANDLING
//! ==============
//! Lookups and mutations on unknown names return `StoreError::NotFound`. A
//! section vanishing from view while a response is in flight is an expected
//! race, so callers log and move on.

#[cfg(test)]
#[path = "sections_test.rs"]
mod sections_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::schema::{FieldSchema, SchemaCache};
use crate::error::{GatewayError, StoreError};
use crate::net::gateway::Gateway;
use crate::net::types::{Column, Record, SectionConfig, SectionPayload};
use crate::util::notify::Notifier;

/// Case-insensitive lookup key for a section name.
pub fn section_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// DOM id for a section card: `section-` plus the lower-cased name with
/// whitespace runs collapsed to `-`.
pub fn section_dom_id(name: &str) -> String {
    let slug = name.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join("-");
    format!("section-{slug}")
}

/// Load lifecycle of one section.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadStatus {
    /// Known by name only; rows have never been fetched.
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Identity and static configuration of a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub icon: String,
    pub columns: Vec<Column>,
    pub supports_add: bool,
    pub supports_edit: bool,
    pub table_name: String,
}

impl Section {
    pub fn from_config(name: impl Into<String>, config: SectionConfig) -> Self {
        Self {
            name: name.into(),
            icon: config.icon,
            columns: config.columns,
            supports_add: config.add_button,
            supports_edit: config.edit_button,
            table_name: config.table,
        }
    }

    pub fn key(&self) -> String {
        section_key(&self.name)
    }

    pub fn dom_id(&self) -> String {
        section_dom_id(&self.name)
    }
}

/// Rows and status of one section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SectionLoadState {
    pub status: LoadStatus,
    /// Most recently fetched page of rows.
    pub rows: Vec<Record>,
    pub total_count: u64,
    pub error: Option<String>,
    /// Set after a save; cleared by the next fetch of this section.
    pub stale: bool,
}

impl SectionLoadState {
    pub fn not_loaded() -> Self {
        Self::default()
    }

    pub fn loaded(rows: Vec<Record>, total_count: u64) -> Self {
        let total_count = total_count.max(rows.len() as u64);
        Self { status: LoadStatus::Loaded, rows, total_count, error: None, stale: false }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: LoadStatus::Failed, error: Some(error.into()), ..Self::default() }
    }
}

/// Split a load-more or bootstrap payload into identity and initial state.
pub fn section_from_payload(name: &str, payload: SectionPayload) -> (Section, SectionLoadState) {
    let section = Section::from_config(name, payload.config);
    let state = match payload.error {
        Some(error) => SectionLoadState::failed(error),
        None => SectionLoadState::loaded(payload.data, payload.total_count),
    };
    (section, state)
}

#[derive(Clone, Debug)]
struct SectionEntry {
    section: Section,
    state: SectionLoadState,
}

#[derive(Debug, Default)]
struct StoreInner {
    /// Keys in registration order.
    order: Vec<String>,
    entries: HashMap<String, SectionEntry>,
    revision: u64,
}

impl StoreInner {
    fn entry_mut(&mut self, name: &str) -> Result<&mut SectionEntry, StoreError> {
        self.entries.get_mut(&section_key(name)).ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }
}

/// Shared handle to the section registry. Clones observe the same state.
#[derive(Clone)]
pub struct SectionStore {
    inner: Rc<RefCell<StoreInner>>,
    notifier: Notifier,
    schemas: SchemaCache,
    gateway: Rc<dyn Gateway>,
}

impl SectionStore {
    pub fn new(gateway: Rc<dyn Gateway>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner::default())),
            notifier: Notifier::new(),
            schemas: SchemaCache::new(),
            gateway,
        }
    }

    /// Register a section, or refresh one that never loaded.
    ///
    /// A `Loaded` entry is left untouched. `NotLoaded`, `Loading` and `Failed`
    /// entries adopt the given identity and state. Returns whether the store
    /// changed.
    pub fn register(&self, section: Section, state: SectionLoadState) -> bool {
        let key = section.key();
        {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            match inner.entries.get_mut(&key) {
                Some(existing) if existing.state.status == LoadStatus::Loaded => {
                    log::debug!("section {} already loaded; keeping rows", section.name);
                    return false;
                }
                Some(existing) => {
                    existing.section = section;
                    existing.state = state;
                }
                None => {
                    inner.order.push(key.clone());
                    inner.entries.insert(key, SectionEntry { section, state });
                }
            }
            inner.revision += 1;
        }
        self.notify();
        true
    }

    /// Register a section straight from a load-more or bootstrap payload.
    pub fn register_payload(&self, name: &str, payload: SectionPayload) -> bool {
        let (section, state) = section_from_payload(name, payload);
        self.register(section, state)
    }

    /// Load state of `name`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn get(&self, name: &str) -> Result<SectionLoadState, StoreError> {
        self.inner
            .borrow()
            .entries
            .get(&section_key(name))
            .map(|entry| entry.state.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    /// Identity of `name`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn section(&self, name: &str) -> Result<Section, StoreError> {
        self.inner
            .borrow()
            .entries
            .get(&section_key(name))
            .map(|entry| entry.section.clone())
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.borrow().entries.contains_key(&section_key(name))
    }

    /// All sections in registration order.
    pub fn sections(&self) -> Vec<Section> {
        let inner = self.inner.borrow();
        inner.order.iter().filter_map(|key| inner.entries.get(key)).map(|entry| entry.section.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.inner.borrow().revision
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn set_status(&self, name: &str, status: LoadStatus) -> Result<(), StoreError> {
        self.mutate(name, |state| {
            state.status = status;
            if status != LoadStatus::Failed {
                state.error = None;
            }
        })
    }

    /// Replace the cached rows wholesale with a freshly fetched page.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn replace_rows(&self, name: &str, rows: Vec<Record>, total_count: u64) -> Result<(), StoreError> {
        self.mutate(name, |state| *state = SectionLoadState::loaded(rows, total_count))
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn mark_stale(&self, name: &str) -> Result<(), StoreError> {
        self.mutate(name, |state| state.stale = true)
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn set_failed(&self, name: &str, error: impl Into<String>) -> Result<(), StoreError> {
        let error = error.into();
        self.mutate(name, |state| {
            state.status = LoadStatus::Failed;
            state.error = Some(error);
        })
    }

    /// A refetch of already displayed rows failed: keep the rows and status,
    /// drop the stale marker and attach the message.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown section.
    pub fn refresh_failed(&self, name: &str, error: impl Into<String>) -> Result<(), StoreError> {
        let error = error.into();
        self.mutate(name, |state| {
            state.stale = false;
            state.error = Some(error);
        })
    }

    /// Re-fetch the first page of `name` after its data changed.
    ///
    /// The section shows as stale until the fetch lands. A failure keeps the
    /// previous rows and attaches the error to the section.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the fetch fails.
    pub async fn refresh(&self, name: &str) -> Result<(), GatewayError> {
        if let Err(err) = self.mark_stale(name) {
            log::debug!("skipping refresh: {err}");
            return Ok(());
        }
        match self.gateway.fetch_page(name, 1).await {
            Ok(page) => {
                let total = page.pagination.and_then(|p| p.total_count).unwrap_or(page.data.len() as u64);
                if let Err(err) = self.replace_rows(name, page.data, total) {
                    log::debug!("refreshed section vanished: {err}");
                }
                Ok(())
            }
            Err(err) => {
                log::warn!("could not refresh {name}: {err}");
                if let Err(missing) = self.refresh_failed(name, format!("Could not refresh: {err}")) {
                    log::debug!("refreshed section vanished: {missing}");
                }
                Err(err)
            }
        }
    }

    /// Register a change listener, called after every mutation.
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.notifier.subscribe(listener);
    }

    /// The notifier shared with components that project through this store.
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Field schema of `name`, fetched once per page lifetime.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure; failures are not cached.
    pub async fn get_or_fetch_schema(&self, name: &str) -> Result<Rc<FieldSchema>, GatewayError> {
        self.schemas.get_or_fetch(&self.gateway, name).await
    }

    pub fn cached_schema(&self, name: &str) -> Option<Rc<FieldSchema>> {
        self.schemas.cached(name)
    }

    fn mutate(&self, name: &str, apply: impl FnOnce(&mut SectionLoadState)) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.borrow_mut();
            let entry = inner.entry_mut(name)?;
            apply(&mut entry.state);
            inner.revision += 1;
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        self.notifier.notify();
    }
}
