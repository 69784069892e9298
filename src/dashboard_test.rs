use std::cell::Cell;

use futures::executor::block_on;

use super::*;
use crate::state::form::{FieldValue, FormMode, FormPhase};
use crate::state::sections::LoadStatus;
use crate::testing::{Call, FakeGateway, field, load_more_body, page_body, payload, search_body};

fn bootstrap(delivered: &[&str], next: usize, has_more: bool) -> Bootstrap {
    let mut boot = Bootstrap::empty("Catalog");
    boot.sections = delivered.iter().map(|name| ((*name).to_owned(), payload(2))).collect();
    boot.next_section_index = next;
    boot.has_more_sections = has_more;
    boot
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn sparse_bootstrap_loads_remaining_sections() {
    let fake = FakeGateway::new();
    fake.push_load_more(Ok(load_more_body(&["C", "D", "E"], false, 5)));
    let dashboard = Dashboard::new(bootstrap(&["A", "B"], 2, true), fake.as_gateway());

    assert_eq!(dashboard.store.len(), 2);
    assert!(dashboard.loader.wants_auto_load());
    block_on(dashboard.loader.auto_load());

    let state = dashboard.loader.state();
    assert!(!state.observer_attached);
    assert!(!state.cursor.has_more);
    assert_eq!(dashboard.store.len(), 5);
}

#[test]
fn complete_bootstrap_starts_exhausted() {
    let fake = FakeGateway::new();
    let dashboard = Dashboard::new(bootstrap(&["A", "B"], 2, false), fake.as_gateway());
    assert!(dashboard.loader.state().is_exhausted());
    assert!(!block_on(dashboard.loader.load_more()));
    assert!(fake.calls().is_empty());
}

#[test]
fn search_hit_can_be_edited_before_its_section_loads() {
    let fake = FakeGateway::new();
    fake.push_search(Ok(search_body(&[("Invoices", 1, 1)])));
    fake.push_fields(Ok(vec![field("name", "text", true)]));
    fake.push_record(Ok(serde_json::json!({"name": "Invoices 1"}).as_object().cloned().unwrap()));
    fake.push_submit(Ok(None));
    fake.push_page(Ok(page_body(1, 1, 1)));
    let dashboard = Dashboard::new(bootstrap(&["A"], 1, true), fake.as_gateway());

    dashboard.search.input("invoices");
    block_on(dashboard.search.search_now());
    dashboard.search.locate("Invoices", Some("1")).unwrap();
    assert_eq!(dashboard.store.get("Invoices").unwrap().status, LoadStatus::NotLoaded);

    block_on(dashboard.forms.open_and_load("Invoices", FormMode::Edit { record_id: "1".to_owned() }));
    dashboard.forms.set_value("name", FieldValue::Text("Renamed".to_owned()));
    block_on(dashboard.forms.submit()).unwrap();
    block_on(dashboard.refresh_after_save("Invoices"));

    assert_eq!(dashboard.forms.state().unwrap().phase, FormPhase::Saved);
    assert_eq!(dashboard.store.get("Invoices").unwrap().status, LoadStatus::Loaded);
    assert!(fake.calls().contains(&Call::Submit {
        section: "Invoices".to_owned(),
        record_id: Some("1".to_owned()),
        values: serde_json::json!({"name": "Renamed"}).as_object().cloned().unwrap(),
    }));
}

#[test]
fn saving_from_view_all_reloads_the_shown_page() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(2, 3, 2)));
    fake.push_fields(Ok(vec![field("name", "text", true)]));
    fake.push_record(Ok(serde_json::json!({"name": "Old"}).as_object().cloned().unwrap()));
    fake.push_submit(Ok(None));
    fake.push_page(Ok(page_body(2, 3, 2)));
    fake.push_page(Ok(page_body(1, 3, 2)));
    let dashboard = Dashboard::new(bootstrap(&["Invoices"], 1, false), fake.as_gateway());

    block_on(dashboard.view_all.open("Invoices", 2));
    block_on(dashboard.forms.open_and_load("Invoices", FormMode::Edit { record_id: "2-1".to_owned() }));
    dashboard.forms.set_value("name", FieldValue::Text("New".to_owned()));
    block_on(dashboard.forms.submit()).unwrap();
    block_on(dashboard.refresh_after_save("Invoices"));

    let pages: Vec<Call> = fake.calls().into_iter().filter(|call| matches!(call, Call::Page(..))).collect();
    assert_eq!(
        pages,
        vec![
            Call::Page("Invoices".to_owned(), 2),
            Call::Page("Invoices".to_owned(), 2),
            Call::Page("Invoices".to_owned(), 1),
        ]
    );
    assert_eq!(dashboard.view_all.state().unwrap().requested_page, 2);
    assert!(!dashboard.store.get("Invoices").unwrap().stale);
}

#[test]
fn saving_elsewhere_leaves_view_all_alone() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(1, 1, 1)));
    fake.push_page(Ok(page_body(1, 1, 3)));
    let dashboard = Dashboard::new(bootstrap(&["A", "B"], 2, false), fake.as_gateway());

    block_on(dashboard.view_all.open("A", 1));
    block_on(dashboard.refresh_after_save("B"));

    assert_eq!(fake.calls(), vec![Call::Page("A".to_owned(), 1), Call::Page("B".to_owned(), 1)]);
    assert_eq!(dashboard.store.get("B").unwrap().rows.len(), 3);
}

#[test]
fn failed_refresh_after_save_surfaces_on_section() {
    let fake = FakeGateway::new();
    fake.push_fields(Ok(vec![field("name", "text", true)]));
    fake.push_submit(Ok(None));
    fake.push_page(Err(crate::error::GatewayError::Transport("server returned status 500".to_owned())));
    let dashboard = Dashboard::new(bootstrap(&["Invoices"], 1, false), fake.as_gateway());

    block_on(dashboard.forms.open_and_load("Invoices", FormMode::Add));
    dashboard.forms.set_value("name", FieldValue::Text("Fresh".to_owned()));
    block_on(dashboard.forms.submit()).unwrap();
    assert!(dashboard.store.get("Invoices").unwrap().stale);
    block_on(dashboard.refresh_after_save("Invoices"));

    let section = dashboard.store.get("Invoices").unwrap();
    assert!(!section.stale);
    assert_eq!(section.status, LoadStatus::Loaded);
    assert_eq!(section.rows.len(), 2);
    assert_eq!(section.error.as_deref(), Some("Could not refresh: server returned status 500"));
}

#[test]
fn every_component_notifies_subscribers() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(1, 1, 1)));
    let dashboard = Dashboard::new(bootstrap(&["A"], 1, false), fake.as_gateway());
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    dashboard.subscribe(move || counter.set(counter.get() + 1));

    dashboard.search.input("x");
    assert_eq!(hits.get(), 1);
    block_on(dashboard.view_all.open("A", 1));
    assert!(hits.get() >= 3);
    let before = hits.get();
    dashboard.forms.open("A", FormMode::Add);
    assert_eq!(hits.get(), before + 1);
}
