use std::collections::BTreeMap;

use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;
use serde_json::json;

use super::*;
use crate::testing::{Call, FakeGateway, field, page_body, payload};

fn invoice_specs() -> Vec<crate::net::types::FieldSpec> {
    let mut number = field("number", "text", true);
    number.max_length = Some(20);
    let mut amount = field("amount", "number", false);
    amount.step = Some("0.01".to_owned());
    vec![number, amount, field("paid", "checkbox", false), field("due", "datetime-local", false)]
}

fn loaded_state() -> FormState {
    let mut state = FormState::new(1, "Invoices", FormMode::Add);
    state.apply_loaded(Rc::new(FieldSchema::from_specs(invoice_specs())), None);
    state
}

fn engine_with(fake: &Rc<FakeGateway>) -> (RecordFormEngine, SectionStore) {
    let store = SectionStore::new(fake.as_gateway());
    store.register_payload("Invoices", payload(2));
    (RecordFormEngine::new(store.clone(), fake.as_gateway()), store)
}

// =============================================================================
// FormState
// =============================================================================

#[test]
fn unchecked_checkbox_serializes_as_false() {
    let mut state = loaded_state();
    state.set_value("number", FieldValue::Text("INV-1".to_owned()));
    let map = state.serialize();
    assert_eq!(map.get("paid"), Some(&Value::Bool(false)));
    assert_eq!(map.get("number"), Some(&json!("INV-1")));
    assert_eq!(map.get("amount"), Some(&json!("")));
}

#[test]
fn checked_checkbox_serializes_as_true() {
    let mut state = loaded_state();
    state.set_value("paid", FieldValue::Flag(true));
    assert_eq!(state.serialize().get("paid"), Some(&Value::Bool(true)));
}

#[test]
fn visual_state_tracks_touch_and_validity() {
    let mut state = loaded_state();
    assert_eq!(state.visual("number"), FieldVisual::Pristine);
    assert_eq!(state.field_message("number"), None);

    state.set_value("number", FieldValue::Text(String::new()));
    assert_eq!(state.visual("number"), FieldVisual::Invalid);
    assert_eq!(state.field_message("number").as_deref(), Some("This field is required."));

    state.set_value("number", FieldValue::Text("INV-9".to_owned()));
    assert_eq!(state.visual("number"), FieldVisual::Valid);
}

#[test]
fn begin_submit_blocks_on_client_issues() {
    let mut state = loaded_state();
    assert!(!state.can_save());
    assert_eq!(state.begin_submit(), Err(FormError::ValidationFailed(1)));
    assert_eq!(state.phase, FormPhase::Editing);
    assert_eq!(state.visual("number"), FieldVisual::Invalid);

    state.set_value("number", FieldValue::Text("INV-2".to_owned()));
    assert_eq!(state.error, None);
    assert!(state.can_save());
}

#[test]
fn add_form_starts_from_defaults() {
    let mut specs = invoice_specs();
    specs[2].default = Some(json!(true));
    specs[1].default = Some(json!(10));
    let mut state = FormState::new(1, "Invoices", FormMode::Add);
    state.apply_loaded(Rc::new(FieldSchema::from_specs(specs)), None);
    assert_eq!(state.value("paid"), FieldValue::Flag(true));
    assert_eq!(state.value("amount"), FieldValue::Text("10".to_owned()));
}

#[test]
fn server_field_errors_clear_on_edit() {
    let mut state = loaded_state();
    state.set_value("number", FieldValue::Text("INV-3".to_owned()));
    state.begin_submit().unwrap();

    let mut field_errors = BTreeMap::new();
    field_errors.insert("number".to_owned(), "Already exists.".to_owned());
    state.finish_submit(Err(GatewayError::Application { message: "Invalid data".to_owned(), field_errors }));

    assert_eq!(state.phase, FormPhase::Editing);
    assert_eq!(state.error, Some(FormError::SaveRejected("Invalid data".to_owned())));
    assert_eq!(state.field_message("number").as_deref(), Some("Already exists."));
    assert_eq!(state.value("number"), FieldValue::Text("INV-3".to_owned()));

    state.set_value("number", FieldValue::Text("INV-4".to_owned()));
    assert_eq!(state.field_message("number"), None);
}

// =============================================================================
// Value normalization
// =============================================================================

#[test]
fn normalizes_edit_values_for_widgets() {
    let schema = FieldSchema::from_specs(invoice_specs());
    let paid = schema.field("paid").unwrap();
    assert_eq!(normalize_value(paid, &json!("on")), FieldValue::Flag(true));
    assert_eq!(normalize_value(paid, &json!(0)), FieldValue::Flag(false));
    assert_eq!(normalize_value(paid, &json!(true)), FieldValue::Flag(true));

    let due = schema.field("due").unwrap();
    assert_eq!(normalize_value(due, &json!("2024-05-01T09:30:00+02:00")), FieldValue::Text("2024-05-01T09:30".to_owned()));
    assert_eq!(normalize_value(due, &json!("2024-05-01 09:30:45")), FieldValue::Text("2024-05-01T09:30".to_owned()));

    let amount = schema.field("amount").unwrap();
    assert_eq!(normalize_value(amount, &json!(12.5)), FieldValue::Text("12.5".to_owned()));
}

// =============================================================================
// RecordFormEngine
// =============================================================================

#[test]
fn edit_save_enabled_only_after_schema_and_record_resolve() {
    let fake = FakeGateway::new();
    let schema_gate = fake.gate_fields();
    let record_gate = fake.gate_record();
    let (engine, _store) = engine_with(&fake);

    let mut pool = LocalPool::new();
    let runner = engine.clone();
    pool.spawner()
        .spawn_local(async move {
            runner.open_and_load("Invoices", FormMode::Edit { record_id: "42".to_owned() }).await;
        })
        .unwrap();
    pool.run_until_stalled();

    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::Loading);
    assert!(!state.can_save());
    assert!(fake.calls().contains(&Call::Record("Invoices".to_owned(), "42".to_owned())));

    schema_gate.send(Ok(invoice_specs())).unwrap();
    pool.run_until_stalled();
    assert!(!engine.state().unwrap().can_save());

    record_gate.send(Ok(json!({"number": "INV-42", "paid": "true"}).as_object().cloned().unwrap())).unwrap();
    pool.run();

    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::Editing);
    assert!(state.can_save());
    assert_eq!(state.value("paid"), FieldValue::Flag(true));
}

#[test]
fn edit_with_blank_required_field_stays_disabled() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(invoice_specs()));
    fake.push_record(Ok(Map::new()));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Edit { record_id: "42".to_owned() }));
    assert!(!engine.state().unwrap().can_save());

    engine.set_value("number", FieldValue::Text("INV-42".to_owned()));
    assert!(engine.state().unwrap().can_save());
}

#[test]
fn schema_failure_is_retryable() {
    let fake = FakeGateway::new();
    fake.push_fields(Err(GatewayError::Transport("offline".to_owned())));
    fake.push_fields(Ok(invoice_specs()));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::LoadFailed);
    assert_eq!(state.error, Some(FormError::SchemaLoadFailed("offline".to_owned())));

    block_on(engine.retry());
    assert_eq!(engine.state().unwrap().phase, FormPhase::Editing);
}

#[test]
fn record_failure_reports_record_error() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(invoice_specs()));
    fake.push_record(Err(GatewayError::application("Record not found")));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Edit { record_id: "9".to_owned() }));
    let state = engine.state().unwrap();
    assert_eq!(state.error, Some(FormError::RecordLoadFailed("Record not found".to_owned())));
    assert!(!state.can_save());
}

#[test]
fn empty_fk_select_fetches_options_in_place() {
    let fake = FakeGateway::new();
    let mut company = field("company", "select", true);
    company.related_model = Some("Company".to_owned());
    company.options = Some(Vec::new());
    fake.push_fields(Ok(vec![company]));
    fake.push_fk_options(Ok(vec![SelectOption { value: "3".to_owned(), label: "Acme".to_owned() }]));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    assert!(fake.calls().contains(&Call::FkOptions("company".to_owned())));
    let options = engine.state().unwrap().select_options("company");
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].value, "");
    assert_eq!(options[1].label, "Acme");
}

#[test]
fn failed_fk_options_show_inline_and_can_be_retried() {
    let fake = FakeGateway::new();
    let mut company = field("company", "select", true);
    company.related_model = Some("Company".to_owned());
    company.options = Some(Vec::new());
    fake.push_fields(Ok(vec![company]));
    fake.push_fk_options(Err(GatewayError::Transport("server returned status 503".to_owned())));
    fake.push_fk_options(Ok(vec![SelectOption { value: "3".to_owned(), label: "Acme".to_owned() }]));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::Editing);
    assert_eq!(state.options_error("company"), Some("Could not load options: server returned status 503"));
    assert_eq!(state.select_options("company").len(), 1);
    assert_eq!(state.pending_option_fields(), vec!["company".to_owned()]);

    block_on(engine.retry_options());
    let state = engine.state().unwrap();
    assert_eq!(state.options_error("company"), None);
    assert_eq!(state.select_options("company")[1].label, "Acme");
    assert_eq!(fake.count(|call| matches!(call, Call::FkOptions(_))), 2);
}

#[test]
fn successful_save_marks_section_stale_without_waiting_on_refetch() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(invoice_specs()));
    fake.push_submit(Ok(Some("Invoice created".to_owned())));
    fake.push_page(Ok(page_body(1, 1, 3)));
    let (engine, store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    engine.set_value("number", FieldValue::Text("INV-7".to_owned()));
    block_on(engine.submit()).unwrap();

    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::Saved);
    assert_eq!(state.notice.as_deref(), Some("Invoice created"));
    assert_eq!(fake.submitted()[0].get("paid"), Some(&Value::Bool(false)));
    assert_eq!(fake.count(|call| matches!(call, Call::Page(..))), 0);
    assert!(store.get("Invoices").unwrap().stale);

    block_on(store.refresh("Invoices")).unwrap();
    assert!(fake.calls().contains(&Call::Page("Invoices".to_owned(), 1)));
    let section = store.get("Invoices").unwrap();
    assert_eq!(section.rows.len(), 3);
    assert!(!section.stale);

    engine.close_if_saved(state.session + 1);
    assert!(engine.is_open());
    engine.close_if_saved(state.session);
    assert!(!engine.is_open());
}

#[test]
fn rejected_save_keeps_form_editable() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(invoice_specs()));
    fake.push_submit(Err(GatewayError::Transport("server returned status 500".to_owned())));
    let (engine, store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    engine.set_value("number", FieldValue::Text("INV-8".to_owned()));
    let err = block_on(engine.submit()).unwrap_err();
    assert_eq!(err, FormError::SaveRejected("server returned status 500".to_owned()));

    let state = engine.state().unwrap();
    assert_eq!(state.phase, FormPhase::Editing);
    assert!(state.can_save());
    assert_eq!(state.value("number"), FieldValue::Text("INV-8".to_owned()));
    assert!(!store.get("Invoices").unwrap().stale);
}

#[test]
fn invalid_form_never_reaches_gateway() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(invoice_specs()));
    let (engine, _store) = engine_with(&fake);

    block_on(engine.open_and_load("Invoices", FormMode::Add));
    assert_eq!(block_on(engine.submit()), Err(FormError::ValidationFailed(1)));
    assert!(fake.submitted().is_empty());
}

#[test]
fn closing_abandons_pending_load() {
    let fake = FakeGateway::new();
    let gate = fake.gate_fields();
    let (engine, _store) = engine_with(&fake);

    let mut pool = LocalPool::new();
    let runner = engine.clone();
    pool.spawner()
        .spawn_local(async move {
            runner.open_and_load("Invoices", FormMode::Add).await;
        })
        .unwrap();
    pool.run_until_stalled();
    engine.close();

    gate.send(Ok(invoice_specs())).unwrap();
    pool.run();
    assert!(engine.state().is_none());
}
