//! Dashboard page: header search, section cards and the load sentinel.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::rc::Rc;

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::app::DashboardContext;
use crate::components::load_sentinel::LoadSentinel;
use crate::components::notice::NoticeToast;
use crate::components::record_modal::RecordModal;
use crate::components::search_panel::SearchPanel;
use crate::components::section_card::SectionCard;
use crate::components::view_all_modal::ViewAllModal;
use crate::config::Bootstrap;
use crate::dashboard::Dashboard;
use crate::net::api::HttpGateway;
use crate::net::gateway::Gateway;
use crate::util::dom;

/// Build the dashboard from the embedded bootstrap, falling back to an empty
/// one for `route_page` when the page shipped none.
fn bootstrap_for(route_page: &str) -> Bootstrap {
    match dom::read_bootstrap() {
        Ok(boot) => boot,
        Err(err) => {
            leptos::logging::warn!("dashboard bootstrap unavailable ({err}); starting empty");
            dom::fallback_bootstrap(route_page, &dom::document_cookies())
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ModalLayer {
    ViewAll,
    Record,
}

/// Open modals in paint order, bottom first. The record editor can be
/// opened from a view-all row, so it always stacks above view-all.
fn modal_layers(view_all_open: bool, form_open: bool) -> Vec<ModalLayer> {
    let mut layers = Vec::with_capacity(2);
    if view_all_open {
        layers.push(ModalLayer::ViewAll);
    }
    if form_open {
        layers.push(ModalLayer::Record);
    }
    layers
}

/// Dashboard page for `/main/:page`.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let params = use_params_map();
    let route_page = params.with_untracked(|p| p.get("page").unwrap_or_default());

    let bootstrap = bootstrap_for(&route_page);
    let gateway: Rc<dyn Gateway> = Rc::new(HttpGateway::new(&bootstrap.config));
    let ctx = DashboardContext::new(Dashboard::new(bootstrap, gateway));
    provide_context(ctx);

    // Self-trigger one batch when the bootstrap was sparse.
    let dashboard = ctx.handle();
    if dashboard.loader.wants_auto_load() {
        let delay = dashboard.config.tunables.auto_load_delay();
        leptos::task::spawn_local(async move {
            dom::sleep(delay).await;
            dashboard.loader.auto_load().await;
        });
    }

    let page_title = ctx.handle().config.page.clone();
    let sections = move || ctx.with(|d| d.store.sections());
    let is_empty = move || ctx.with(|d| d.store.is_empty() && d.loader.state().is_exhausted());
    let layers = Memo::new(move |_| ctx.with(|d| modal_layers(d.view_all.state().is_some(), d.forms.is_open())));

    view! {
        <div class="dashboard-page">
            <header class="dashboard-page__header">
                <h1>{page_title}</h1>
                <SearchPanel/>
            </header>

            <main class="dashboard-page__sections">
                <Show when=is_empty>
                    <p class="dashboard-page__empty">"No sections are configured for this page."</p>
                </Show>
                <For each=sections key=|section| section.key() let:section>
                    <SectionCard section=section/>
                </For>
                <LoadSentinel/>
            </main>

            // Keyed so an open modal stays mounted when another stacks on it.
            <For each=move || layers.get() key=|layer| *layer let:layer>
                {match layer {
                    ModalLayer::ViewAll => view! { <ViewAllModal/> }.into_any(),
                    ModalLayer::Record => view! { <RecordModal/> }.into_any(),
                }}
            </For>
            <NoticeToast/>
        </div>
    }
}
