//! Transient page notice (save confirmations).

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::util::dom;

/// Shows `DashboardContext::notice` and clears it after the configured TTL.
#[component]
pub fn NoticeToast() -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let ttl = ctx.handle().config.tunables.notice_ttl();

    Effect::new(move |_| {
        let Some(text) = ctx.notice.get() else {
            return;
        };
        leptos::task::spawn_local(async move {
            dom::sleep(ttl).await;
            // A newer notice restarts its own timer.
            if ctx.notice.get_untracked().as_deref() == Some(text.as_str()) {
                ctx.notice.set(None);
            }
        });
    });

    view! {
        {move || {
            ctx.notice
                .get()
                .map(|text| {
                    view! {
                        <div class="notice-toast" role="status" on:click=move |_| ctx.notice.set(None)>
                            {text}
                        </div>
                    }
                })
        }}
    }
}
