//! Root application component with routing and the dashboard context.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Route, Router, Routes},
};

use crate::dashboard::Dashboard;
use crate::pages::dashboard::DashboardPage;

/// Reactive handle to the page's [`Dashboard`], provided as context.
///
/// The dashboard itself is `Rc`-based and lives in a local `StoredValue`;
/// `revision` is bumped by a store listener after every state change, so any
/// closure that reads through [`DashboardContext::with`] re-runs when state
/// moves.
#[derive(Clone, Copy)]
pub struct DashboardContext {
    dashboard: StoredValue<Dashboard, LocalStorage>,
    revision: RwSignal<u64>,
    /// Transient page-level message (save confirmations).
    pub notice: RwSignal<Option<String>>,
}

impl DashboardContext {
    pub fn new(dashboard: Dashboard) -> Self {
        let revision = RwSignal::new(0_u64);
        dashboard.subscribe(move || revision.update(|r| *r = r.wrapping_add(1)));
        Self { dashboard: StoredValue::new_local(dashboard), revision, notice: RwSignal::new(None) }
    }

    /// Read dashboard state, subscribing the caller to changes.
    pub fn with<R>(&self, f: impl FnOnce(&Dashboard) -> R) -> R {
        self.revision.track();
        self.dashboard.with_value(f)
    }

    /// A handle for event handlers and async tasks; does not subscribe.
    pub fn handle(&self) -> Dashboard {
        self.dashboard.get_value()
    }
}

/// Root application component.
///
/// Django renders the page shell; the app mounts into its body and routes on
/// the dashboard page identity.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Dashboard"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=(StaticSegment("main"), ParamSegment("page")) view=DashboardPage/>
            </Routes>
        </Router>
    }
}
