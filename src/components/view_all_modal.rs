//! Paginated "view all" table for one section.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::net::types::Record;
use crate::state::form::FormMode;
use crate::state::paginator::{PageControls, ViewAllPhase};

fn go_to(ctx: DashboardContext, page: u32) {
    let dashboard = ctx.handle();
    let Some(section) = dashboard.view_all.state().map(|s| s.section) else {
        return;
    };
    leptos::task::spawn_local(async move {
        dashboard.view_all.open(&section, page).await;
    });
}

#[component]
fn PageNav(controls: PageControls) -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let previous = controls.previous;
    let next = controls.next;
    let current = controls.current;

    let pages = controls
        .pages
        .into_iter()
        .map(|page| {
            let is_current = page == current;
            view! {
                <button
                    class="btn btn--small page-nav__page"
                    class:page-nav__page--current=is_current
                    prop:disabled=is_current
                    on:click=move |_| go_to(ctx, page)
                >
                    {page}
                </button>
            }
        })
        .collect_view();

    view! {
        <nav class="page-nav">
            <button
                class="btn btn--small"
                prop:disabled=previous.is_none()
                on:click=move |_| previous.into_iter().for_each(|page| go_to(ctx, page))
            >
                "Previous"
            </button>
            {pages}
            <button
                class="btn btn--small"
                prop:disabled=next.is_none()
                on:click=move |_| next.into_iter().for_each(|page| go_to(ctx, page))
            >
                "Next"
            </button>
        </nav>
    }
}

/// Modal listing every record of the section, one server page at a time.
#[component]
pub fn ViewAllModal() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();

    let title = move || ctx.with(|d| d.view_all.state()).map(|s| s.section).unwrap_or_default();
    let on_close = move || ctx.handle().view_all.close();
    let on_retry = move |_| {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            dashboard.view_all.reload().await;
        });
    };
    let edit_record = Callback::new(move |(section, pk): (String, String)| {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            dashboard.forms.open_and_load(&section, FormMode::Edit { record_id: pk }).await;
        });
    });

    let body = move || {
        let Some((state, window)) = ctx.with(|d| d.view_all.state().map(|s| (s, d.view_all.page_window()))) else {
            return ().into_any();
        };
        match &state.phase {
            ViewAllPhase::Loading => {
                let text = format!("Loading page {}\u{2026}", state.requested_page);
                view! { <p class="dialog__status">{text}</p> }.into_any()
            }
            ViewAllPhase::Failed(message) => view! {
                <div class="dialog__error">
                    <p>{message.clone()}</p>
                    <button class="btn" on:click=on_retry>"Retry"</button>
                </div>
            }
                .into_any(),
            ViewAllPhase::Empty => view! { <p class="dialog__status">"No records found."</p> }.into_any(),
            ViewAllPhase::Loaded => {
                let controls = state.controls(window);
                let summary = state.cursor.as_ref().map(|c| match c.total_count {
                    Some(total) => format!("Page {} of {} ({total} records)", c.current_page, c.total_pages),
                    None => format!("Page {} of {}", c.current_page, c.total_pages),
                });
                let headers = state.columns.iter().map(|c| view! { <th>{c.display_name.clone()}</th> }).collect_view();
                let edit_header = state.supports_edit.then(|| view! { <th></th> });
                let rows = state
                    .rows
                    .iter()
                    .map(|record: &Record| {
                        let cells = state
                            .columns
                            .iter()
                            .map(|c| {
                                let text = record.display_value(&c.db_column).unwrap_or_else(|| "\u{2014}".to_owned());
                                view! { <td>{text}</td> }
                            })
                            .collect_view();
                        let edit = state.supports_edit.then(|| {
                            let key = (state.section.clone(), record.pk.clone());
                            view! {
                                <td>
                                    <button class="btn btn--small" on:click=move |_| edit_record.run(key.clone())>"Edit"</button>
                                </td>
                            }
                        });
                        view! { <tr>{cells} {edit}</tr> }
                    })
                    .collect_view();
                view! {
                    {summary.map(|text| view! { <p class="view-all__summary">{text}</p> })}
                    <table class="view-all__table">
                        <thead>
                            <tr>{headers} {edit_header}</tr>
                        </thead>
                        <tbody>{rows}</tbody>
                    </table>
                    {controls.map(|controls| view! { <PageNav controls=controls/> })}
                }
                    .into_any()
            }
        }
    };

    view! {
        <div class="dialog-backdrop" on:click=move |_| on_close()>
            <div class="dialog dialog--view-all" on:click=move |ev| ev.stop_propagation()>
                <h2 class="dialog__title">{title}</h2>
                <div class="view-all__body">{body}</div>
                <div class="dialog__actions">
                    <button class="btn" on:click=move |_| on_close()>
                        "Close"
                    </button>
                </div>
            </div>
        </div>
    }
}
