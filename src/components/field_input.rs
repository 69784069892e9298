//! One schema-driven form control.

use leptos::prelude::*;

use crate::app::DashboardContext;
use crate::state::form::{FieldValue, FieldVisual, FormPhase};
use crate::state::schema::{Field, FieldKind};

fn visual_class(visual: FieldVisual) -> &'static str {
    match visual {
        FieldVisual::Pristine => "form-field__control",
        FieldVisual::Valid => "form-field__control form-field__control--valid",
        FieldVisual::Invalid => "form-field__control form-field__control--invalid",
    }
}

/// Label, widget and validation message for `field`, bound to the open
/// editor session.
#[component]
pub fn FieldInput(field: Field) -> impl IntoView {
    let ctx = expect_context::<DashboardContext>();
    let name = field.name.clone();

    let value = {
        let name = name.clone();
        move || ctx.with(|d| d.forms.state().map(|s| s.value(&name)))
    };
    let text = {
        let value = value.clone();
        move || value().map(|v| v.as_text()).unwrap_or_default()
    };
    let class = {
        let name = name.clone();
        move || visual_class(ctx.with(|d| d.forms.state().map_or(FieldVisual::Pristine, |s| s.visual(&name))))
    };
    let message = {
        let name = name.clone();
        move || ctx.with(|d| d.forms.state().and_then(|s| s.field_message(&name)))
    };
    let options_error = {
        let name = name.clone();
        move || ctx.with(|d| d.forms.state().and_then(|s| s.options_error(&name).map(str::to_owned)))
    };
    let on_retry_options = move |_| {
        let dashboard = ctx.handle();
        leptos::task::spawn_local(async move {
            dashboard.forms.retry_options().await;
        });
    };
    let disabled = move || ctx.with(|d| d.forms.state().is_none_or(|s| s.phase != FormPhase::Editing));

    let set_text = {
        let name = name.clone();
        move |ev| ctx.handle().forms.set_value(&name, FieldValue::Text(event_target_value(&ev)))
    };

    let input_id = format!("field-{name}");
    let widget = match &field.kind {
        FieldKind::Checkbox => {
            let name = name.clone();
            let on_change = move |ev| ctx.handle().forms.set_value(&name, FieldValue::Flag(event_target_checked(&ev)));
            view! {
                <input
                    id=input_id.clone()
                    type="checkbox"
                    class=class
                    prop:checked=move || value().is_some_and(|v| v.is_checked())
                    prop:disabled=disabled
                    on:change=on_change
                />
            }
                .into_any()
        }
        FieldKind::Textarea => view! {
            <textarea
                id=input_id.clone()
                class=class
                rows="4"
                maxlength=field.max_length.map(|n| n.to_string())
                prop:value=text
                prop:disabled=disabled
                on:input=set_text
            ></textarea>
        }
            .into_any(),
        FieldKind::Select { .. } => {
            let options = {
                let name = name.clone();
                move || {
                    let selected = text();
                    ctx.with(|d| d.forms.state().map(|s| s.select_options(&name)).unwrap_or_default())
                        .into_iter()
                        .map(|option| {
                            let is_selected = option.value == selected;
                            view! { <option value=option.value selected=is_selected>{option.label}</option> }
                        })
                        .collect_view()
                }
            };
            view! {
                <select id=input_id.clone() class=class prop:disabled=disabled on:change=set_text>
                    {options}
                </select>
            }
                .into_any()
        }
        kind => {
            let step = match kind {
                FieldKind::Number { step } => Some(step.clone().unwrap_or_else(|| "any".to_owned())),
                _ => None,
            };
            view! {
                <input
                    id=input_id.clone()
                    type=kind.input_type()
                    class=class
                    step=step
                    maxlength=field.max_length.map(|n| n.to_string())
                    prop:value=text
                    prop:disabled=disabled
                    on:input=set_text
                />
            }
                .into_any()
        }
    };

    let help = (!field.help_text.is_empty()).then(|| view! { <small class="form-field__help">{field.help_text.clone()}</small> });
    let required = field.required.then(|| view! { <span class="form-field__required">"*"</span> });

    view! {
        <div class="form-field">
            <label class="form-field__label" for=input_id>
                {field.label.clone()}
                {required}
            </label>
            {widget}
            {help}
            {move || message().map(|text| view! { <div class="form-field__message">{text}</div> })}
            {move || {
                options_error()
                    .map(|text| {
                        view! {
                            <div class="form-field__message form-field__message--options">
                                <span>{text}</span>
                                <button type="button" class="btn btn--small" on:click=on_retry_options>"Retry"</button>
                            </div>
                        }
                    })
            }}
        </div>
    }
}
