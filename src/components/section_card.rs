//! Card rendering one section's rows from the store.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::net::types::Record;
use crate::state::form::FormMode;
use crate::state::sections::{LoadStatus, Section};

fn cell_text(record: &Record, column: &str) -> String {
    record.display_value(column).unwrap_or_else(|| "\u{2014}".to_owned())
}

/// One section card. Identity is re-read from the store so a section first
/// registered from search picks up its full configuration later.
#[component]
pub fn SectionCard(section: Section) -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let name = section.name.clone();
    let dom_id = section.dom_id();

    let current = {
        let name = name.clone();
        move || ctx.with(|d| d.store.section(&name).ok())
    };
    let state = {
        let name = name.clone();
        move || ctx.with(|d| d.store.get(&name).ok()).unwrap_or_default()
    };
    let highlight = {
        let name = name.clone();
        move || {
            ctx.with(|d| d.search.state().highlight)
                .filter(|(section, _)| section.eq_ignore_ascii_case(&name))
                .map(|(_, pk)| pk)
        }
    };

    let on_add = {
        let name = name.clone();
        move |_| {
            let dashboard = ctx.handle();
            let name = name.clone();
            leptos::task::spawn_local(async move {
                dashboard.forms.open_and_load(&name, FormMode::Add).await;
            });
        }
    };
    let on_view_all = {
        let name = name.clone();
        move |_| {
            let dashboard = ctx.handle();
            let name = name.clone();
            leptos::task::spawn_local(async move {
                dashboard.view_all.open(&name, 1).await;
            });
        }
    };
    let on_refresh = {
        let name = name.clone();
        move |_| {
            let dashboard = ctx.handle();
            let name = name.clone();
            leptos::task::spawn_local(async move {
                if dashboard.store.refresh(&name).await.is_ok() {
                    log::debug!("refreshed {name}");
                }
            });
        }
    };
    let edit_record = {
        let name = name.clone();
        Callback::new(move |pk: String| {
            let dashboard = ctx.handle();
            let name = name.clone();
            leptos::task::spawn_local(async move {
                dashboard.forms.open_and_load(&name, FormMode::Edit { record_id: pk }).await;
            });
        })
    };

    let header_section = current.clone();
    let title = move || header_section().map(|s| s.name).unwrap_or_default();
    let icon_section = current.clone();
    let icon = move || icon_section().map(|s| s.icon).unwrap_or_default();
    let add_section = current.clone();
    let supports_add = move || add_section().is_some_and(|s| s.supports_add);
    let count_state = state.clone();
    let count = move || {
        let s = count_state();
        (s.status == LoadStatus::Loaded).then(|| format!("{} records", s.total_count))
    };

    let body = move || {
        let s = state();
        let Some(section) = current() else {
            return view! { <p class="section-card__message">"This section is no longer available."</p> }.into_any();
        };
        match s.status {
            LoadStatus::NotLoaded => view! {
                <p class="section-card__message">"Records for this section have not been loaded yet. Use \"View all\" to browse them."</p>
            }
                .into_any(),
            LoadStatus::Loading => view! { <p class="section-card__message">"Loading\u{2026}"</p> }.into_any(),
            LoadStatus::Failed => {
                let message = s.error.unwrap_or_else(|| "Could not load this section.".to_owned());
                view! { <p class="section-card__message section-card__message--error">{message}</p> }.into_any()
            }
            LoadStatus::Loaded if s.rows.is_empty() && s.error.is_none() => {
                view! { <p class="section-card__message">"No records yet."</p> }.into_any()
            }
            LoadStatus::Loaded => {
                let highlighted = highlight();
                let headers = section
                    .columns
                    .iter()
                    .map(|c| view! { <th>{c.display_name.clone()}</th> })
                    .collect_view();
                let rows = s
                    .rows
                    .iter()
                    .map(|record| {
                        let cells = section
                            .columns
                            .iter()
                            .map(|c| view! { <td>{cell_text(record, &c.db_column)}</td> })
                            .collect_view();
                        let is_highlighted = highlighted.as_deref() == Some(record.pk.as_str());
                        let pk = record.pk.clone();
                        let edit = section.supports_edit.then(|| {
                            view! {
                                <td class="section-card__actions">
                                    <button class="btn btn--small" on:click=move |_| edit_record.run(pk.clone())>
                                        "Edit"
                                    </button>
                                </td>
                            }
                        });
                        view! {
                            <tr class="section-card__row" class:section-card__row--highlight=is_highlighted>
                                {cells}
                                {edit}
                            </tr>
                        }
                    })
                    .collect_view();
                let edit_header = section.supports_edit.then(|| view! { <th></th> });
                let stale = s.stale.then(|| view! { <span class="section-card__stale">"Refreshing\u{2026}"</span> });
                let refresh_error = s.error.clone().map(|message| {
                    let on_refresh = on_refresh.clone();
                    view! {
                        <div class="section-card__message section-card__message--error">
                            <span>{message}</span>
                            <button class="btn btn--small" on:click=on_refresh>"Retry"</button>
                        </div>
                    }
                });
                view! {
                    {stale}
                    {refresh_error}
                    <table class="section-card__table">
                        <thead>
                            <tr>{headers} {edit_header}</tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                }
                    .into_any()
            }
        }
    };

    view! {
        <section class="section-card" id=dom_id>
            <header class="section-card__header">
                <span class="material-icons section-card__icon">{icon}</span>
                <h2 class="section-card__title">{title}</h2>
                <span class="section-card__count">{count}</span>
                <div class="section-card__tools">
                    <Show when=supports_add.clone()>
                        <button class="btn btn--primary btn--small" on:click=on_add.clone()>"Add"</button>
                    </Show>
                    <button class="btn btn--small" on:click=on_view_all>"View all"</button>
                </div>
            </header>
            <div class="section-card__body">{body}</div>
        </section>
    }
}
