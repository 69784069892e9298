//! Add/edit record dialog driven by the form engine.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::components::field_input::FieldInput;
use crate::state::form::FormPhase;
use crate::util::dom;

/// Modal editor for the open form session.
#[component]
pub fn RecordModal() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();

    let title = move || {
        ctx.with(|d| d.forms.state())
            .map_or_else(String::new, |s| format!("{} {}", if s.is_add() { "Add" } else { "Edit" }, s.section))
    };
    let phase = move || ctx.with(|d| d.forms.state().map(|s| s.phase));
    let loading = move || phase() == Some(FormPhase::Loading);
    let load_failed = move || phase() == Some(FormPhase::LoadFailed);
    let has_fields = move || matches!(phase(), Some(FormPhase::Editing | FormPhase::Submitting | FormPhase::Saved));
    let submitting = move || phase() == Some(FormPhase::Submitting);
    let can_save = move || ctx.with(|d| d.forms.state().is_some_and(|s| s.can_save()));
    let error = move || ctx.with(|d| d.forms.state().and_then(|s| s.error)).map(|e| e.to_string());
    let notice = move || ctx.with(|d| d.forms.state().and_then(|s| s.notice));

    // Keyed by session so a reopened editor gets fresh inputs.
    let fields = move || {
        ctx.with(|d| d.forms.state())
            .map(|s| s.fields().iter().map(|f| (s.session, f.clone())).collect::<Vec<_>>())
            .unwrap_or_default()
    };

    let on_cancel = Callback::new(move |()| ctx.handle().forms.close());
    let on_retry = move |_| {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            dashboard.forms.retry().await;
        });
    };
    let on_save = Callback::new(move |()| {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            if dashboard.forms.submit().await.is_err() {
                return;
            }
            let Some(state) = dashboard.forms.state() else {
                return;
            };
            let refresher = dashboard.clone();
            let section = state.section.clone();
            leptos::task::spawn_local(async move {
                refresher.refresh_after_save(&section).await;
            });
            ctx.notice.set(state.notice.clone());
            dom::sleep(dashboard.config.tunables.save_close_delay()).await;
            dashboard.forms.close_if_saved(state.session);
        });
    });
    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        if ev.key() == "Escape" {
            on_cancel.run(());
        }
    };

    view! {
        <div class="dialog-backdrop" on:click=move |_| on_cancel.run(())>
            <div class="dialog dialog--record" on:click=move |ev| ev.stop_propagation() on:keydown=on_keydown>
                <h2 class="dialog__title">{title}</h2>

                <Show when=loading>
                    <p class="dialog__status">"Loading form\u{2026}"</p>
                </Show>
                <Show when=load_failed>
                    <div class="dialog__error">
                        <p>{error}</p>
                        <button class="btn" on:click=on_retry>"Retry"</button>
                    </div>
                </Show>
                <Show when=has_fields>
                    {move || notice().map(|text| view! { <div class="dialog__notice">{text}</div> })}
                    {move || {
                        ctx.with(|d| d.forms.state().and_then(|s| s.error))
                            .filter(|e| e.is_editable())
                            .map(|e| view! { <div class="dialog__error">{e.to_string()}</div> })
                    }}
                    <form class="record-form" on:submit=move |ev| {
                        ev.prevent_default();
                        on_save.run(());
                    }>
                        <For
                            each=fields
                            key=|(session, field)| (*session, field.name.clone())
                            children=|(_, field)| view! { <FieldInput field=field/> }
                        />
                    </form>
                </Show>

                <div class="dialog__actions">
                    <button class="btn" on:click=move |_| on_cancel.run(())>
                        "Cancel"
                    </button>
                    <button class="btn btn--primary" prop:disabled=move || !can_save() on:click=move |_| on_save.run(())>
                        {move || if submitting() { "Saving\u{2026}" } else { "Save" }}
                    </button>
                </div>
            </div>
        </div>
    }
}
