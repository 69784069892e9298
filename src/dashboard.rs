//! Composition root for one dashboard page.
//!
//! SYSTEM CONTEXT
//! ==============
//! [`Dashboard`] is built once from the bootstrap document and a gateway.
//! Every component receives the configuration, the gateway and the shared
//! store through its constructor; nothing reads ambient globals. Clones are
//! cheap handles onto the same state.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::rc::Rc;

use crate::config::{Bootstrap, DashboardConfig};
use crate::net::gateway::Gateway;
use crate::state::form::RecordFormEngine;
use crate::state::loader::{LoadCursor, ProgressiveSectionLoader};
use crate::state::paginator::ViewAllPaginator;
use crate::state::search::SearchOrchestrator;
use crate::state::sections::SectionStore;

#[derive(Clone)]
pub struct Dashboard {
    pub config: Rc<DashboardConfig>,
    pub store: SectionStore,
    pub loader: ProgressiveSectionLoader,
    pub search: SearchOrchestrator,
    pub forms: RecordFormEngine,
    pub view_all: ViewAllPaginator,
}

impl Dashboard {
    pub fn new(bootstrap: Bootstrap, gateway: Rc<dyn Gateway>) -> Self {
        let Bootstrap { config, sections, next_section_index, has_more_sections } = bootstrap;
        let tunables = config.tunables;

        let store = SectionStore::new(Rc::clone(&gateway));
        for (name, payload) in sections {
            store.register_payload(&name, payload);
        }
        log::info!(
            "dashboard {} bootstrapped with {} section(s); next index {next_section_index}, more: {has_more_sections}",
            config.page,
            store.len()
        );

        let cursor = LoadCursor { next_section_index, has_more: has_more_sections };
        Self {
            loader: ProgressiveSectionLoader::new(store.clone(), Rc::clone(&gateway), cursor, tunables),
            search: SearchOrchestrator::new(store.clone(), Rc::clone(&gateway), tunables),
            forms: RecordFormEngine::new(store.clone(), Rc::clone(&gateway)),
            view_all: ViewAllPaginator::new(store.clone(), gateway, tunables),
            config: Rc::new(config),
            store,
        }
    }

    /// Bring every view of `section` up to date after a save: the open
    /// view-all page first, then the section's rows in the store.
    pub async fn refresh_after_save(&self, section: &str) {
        if self.view_all.reload_section(section).await {
            log::debug!("reloaded view-all for {section} after save");
        }
        if self.store.refresh(section).await.is_ok() {
            log::debug!("refreshed {section} after save");
        }
    }

    /// Register a listener fired after any state change in any component.
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.store.subscribe(listener);
    }
}
