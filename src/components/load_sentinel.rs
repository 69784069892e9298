//! Bottom-of-page sentinel that pulls in further section batches.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::state::loader::LoadPhase;

fn load_more(ctx: DashboardContext) {
    let dashboard = ctx.handle();
    leptos::task::spawn_local(async move {
        dashboard.loader.load_more().await;
    });
}

/// Watches the end of the section list and requests the next batch when it
/// scrolls into view. Also offers a manual "Load more" fallback.
#[component]
pub fn LoadSentinel() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let sentinel = NodeRef::<leptos::html::Div>::new();

    let attached = move || ctx.with(|d| d.loader.state().observer_attached);
    let loading = move || ctx.with(|d| d.loader.state().phase == LoadPhase::Loading);
    let last_error = move || ctx.with(|d| d.loader.state().last_error);

    #[cfg(feature = "csr")]
    {
        use crate::util::viewport::ViewportObserver;

        let observer = StoredValue::new_local(None::<ViewportObserver>);
        Effect::new(move |_| {
            let Some(element) = sentinel.get() else {
                return;
            };
            if !attached() {
                observer.set_value(None);
                return;
            }
            if observer.with_value(Option::is_some) {
                return;
            }
            match ViewportObserver::observe(&element, move || load_more(ctx)) {
                Ok(watch) => observer.set_value(Some(watch)),
                Err(err) => leptos::logging::warn!("viewport observer unavailable: {err}"),
            }
        });
        on_cleanup(move || observer.set_value(None));
    }

    let on_retry = move |_| {
        ctx.handle().loader.dismiss_error();
        load_more(ctx);
    };
    let on_dismiss = move |_| ctx.handle().loader.dismiss_error();

    view! {
        <div class="load-sentinel" node_ref=sentinel>
            <Show when=loading>
                <p class="load-sentinel__status">"Loading more sections\u{2026}"</p>
            </Show>
            {move || {
                last_error()
                    .map(|message| {
                        view! {
                            <div class="load-sentinel__error">
                                <span>{message}</span>
                                <button class="btn btn--small" on:click=on_retry>"Retry"</button>
                                <button class="btn btn--small" on:click=on_dismiss>"Dismiss"</button>
                            </div>
                        }
                    })
            }}
            <Show when=move || attached() && !loading() && last_error().is_none()>
                <button class="btn load-sentinel__more" on:click=move |_| load_more(ctx)>"Load more"</button>
            </Show>
        </div>
    }
}
