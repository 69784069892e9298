//! Header search box and floating results panel.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::state::search::{SearchGroup, SearchPhase};
use crate::util::dom;

/// Scroll to a located section, or open it in the paginator when its rows
/// were never loaded.
fn reveal_section(ctx: DashboardContext, section: String, pk: Option<String>) {
    let dashboard = ctx.handle();
    let Some(dom_id) = dashboard.search.locate(&section, pk.as_deref()) else {
        return;
    };
    if dashboard.search.is_section_loaded(&section) {
        if !dom::scroll_into_view(&dom_id) {
            leptos::logging::warn!("section element #{dom_id} not rendered yet");
        }
    } else {
        leptos::task::spawn_local(async move {
            dashboard.view_all.open(&section, 1).await;
        });
    }
}

#[component]
fn SearchGroupView(group: SearchGroup, limit: usize) -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let section = group.section.clone();
    let icon = group.config.icon.clone();
    let overflow = group.overflow(limit);

    let rows = group
        .preview(limit)
        .into_iter()
        .map(|row| {
            let section = section.clone();
            let pk = row.pk.clone();
            let details = (!row.details.is_empty()).then(|| view! { <div class="search-hit__details">{row.details}</div> });
            view! {
                <li class="search-hit" on:click=move |_| reveal_section(ctx, section.clone(), Some(pk.clone()))>
                    <div class="search-hit__title">{row.title}</div>
                    {details}
                </li>
            }
        })
        .collect_view();

    let view_all = overflow.map(|count| {
        let section = section.clone();
        let label = format!("View all {count} results in {section}");
        view! {
            <button class="search-group__more" on:click=move |_| reveal_section(ctx, section.clone(), None)>
                {label}
            </button>
        }
    });

    view! {
        <div class="search-group">
            <div class="search-group__header">
                <span class="material-icons">{icon}</span>
                <span class="search-group__name">{group.section.clone()}</span>
                <span class="search-group__count">{group.count}</span>
            </div>
            <ul class="search-group__hits">{rows}</ul>
            {view_all}
        </div>
    }
}

/// Debounced search input with the results panel.
#[component]
pub fn SearchPanel() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();

    let query = move || ctx.with(|d| d.search.state().query);
    let visible = move || ctx.with(|d| d.search.state().visible);
    let has_query = move || !query().is_empty();

    let on_input = move |ev| {
        let dashboard = ctx.handle();
        let Some(ticket) = dashboard.search.input(&event_target_value(&ev)) else {
            return;
        };
        let delay = dashboard.config.tunables.search_debounce();
        leptos::task::spawn_local(async move {
            dom::sleep(delay).await;
            dashboard.search.fire(ticket).await;
        });
    };
    let search_now = move || {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            dashboard.search.search_now().await;
        });
    };
    let on_keydown = move |ev: leptos::ev::KeyboardEvent| match ev.key().as_str() {
        "Enter" => {
            ev.prevent_default();
            search_now();
        }
        "Escape" => ctx.handle().search.dismiss(),
        _ => {}
    };
    let on_focus = move |_| ctx.handle().search.reveal();
    let on_clear = move |_| ctx.handle().search.clear();
    let on_dismiss = move |_| ctx.handle().search.dismiss();

    let results = move || {
        let (state, limit) = ctx.with(|d| (d.search.state(), d.search.preview_limit()));
        match state.phase {
            SearchPhase::Idle => ().into_any(),
            SearchPhase::Searching => view! { <p class="search-panel__status">"Searching\u{2026}"</p> }.into_any(),
            SearchPhase::Empty => {
                let text = format!("No results found for \"{}\"", state.query.trim());
                view! { <p class="search-panel__status">{text}</p> }.into_any()
            }
            SearchPhase::Failed => {
                let text = state.error.unwrap_or_else(|| "Search failed.".to_owned());
                view! { <p class="search-panel__status search-panel__status--error">{text}</p> }.into_any()
            }
            SearchPhase::Results => {
                let summary = format!("{} results", state.total_matches());
                let groups = state
                    .groups
                    .into_iter()
                    .map(|group| view! { <SearchGroupView group=group limit=limit/> })
                    .collect_view();
                view! {
                    <div class="search-panel__summary">{summary}</div>
                    {groups}
                }
                    .into_any()
            }
        }
    };

    view! {
        <div class="search-panel">
            <div class="search-panel__box">
                <input
                    class="search-panel__input"
                    type="search"
                    placeholder="Search all sections\u{2026}"
                    prop:value=query
                    on:input=on_input
                    on:keydown=on_keydown
                    on:focus=on_focus
                />
                <Show when=has_query>
                    <button class="search-panel__clear" title="Clear search" on:click=on_clear>"\u{00d7}"</button>
                </Show>
                <button class="btn btn--primary search-panel__go" on:click=move |_| search_now()>"Search"</button>
            </div>
            <Show when=visible>
                <div class="search-panel__scrim" on:click=on_dismiss></div>
                <div class="search-panel__results" on:click=move |ev| ev.stop_propagation()>
                    <button class="search-panel__close" title="Close" on:click=on_dismiss>"\u{00d7}"</button>
                    {results}
                </div>
            </Show>
        </div>
    }
}
