use futures::executor::block_on;

use super::*;
use crate::error::GatewayError;
use crate::testing::{Call, FakeGateway, page_body, payload};

fn cursor(current_page: u32, total_pages: u32) -> Pagination {
    Pagination {
        current_page,
        total_pages,
        has_next: current_page < total_pages,
        has_previous: current_page > 1,
        total_count: None,
    }
}

// =============================================================================
// Page window
// =============================================================================

#[test]
fn window_centres_on_current_page() {
    assert_eq!(page_window(5, 10, 5), vec![3, 4, 5, 6, 7]);
}

#[test]
fn window_clamps_at_edges() {
    assert_eq!(page_window(1, 10, 5), vec![1, 2, 3]);
    assert_eq!(page_window(10, 10, 5), vec![8, 9, 10]);
    assert_eq!(page_window(2, 3, 5), vec![1, 2, 3]);
}

#[test]
fn window_never_exceeds_limit() {
    for current in 1..=20 {
        assert!(page_window(current, 20, 5).len() <= 5);
    }
}

#[test]
fn single_page_has_no_controls() {
    assert_eq!(PageControls::from_cursor(&cursor(1, 1), 5), None);
}

#[test]
fn last_page_has_no_next() {
    let controls = PageControls::from_cursor(&cursor(4, 4), 5).unwrap();
    assert_eq!(controls.next, None);
    assert_eq!(controls.previous, Some(3));
}

#[test]
fn first_page_has_no_previous() {
    let controls = PageControls::from_cursor(&cursor(1, 4), 5).unwrap();
    assert_eq!(controls.previous, None);
    assert_eq!(controls.next, Some(2));
}

// =============================================================================
// ViewAllPaginator
// =============================================================================

#[test]
fn open_fetches_page_and_writes_store() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(2, 3, 4)));
    let store = SectionStore::new(fake.as_gateway());
    store.register_payload("Invoices", payload(1));
    let paginator = ViewAllPaginator::new(store.clone(), fake.as_gateway(), Tunables::default());

    block_on(paginator.open("Invoices", 2));

    assert_eq!(fake.calls(), vec![Call::Page("Invoices".to_owned(), 2)]);
    let view = paginator.state().unwrap();
    assert_eq!(view.phase, ViewAllPhase::Loaded);
    assert_eq!(view.rows.len(), 4);
    assert!(view.supports_edit);
    let controls = view.controls(paginator.page_window()).unwrap();
    assert_eq!(controls.pages, vec![1, 2, 3]);

    let section = store.get("Invoices").unwrap();
    assert_eq!(section.rows[0].pk, "2-1");
}

#[test]
fn every_page_change_refetches() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(1, 2, 2)));
    fake.push_page(Ok(page_body(2, 2, 1)));
    fake.push_page(Ok(page_body(1, 2, 2)));
    let store = SectionStore::new(fake.as_gateway());
    let paginator = ViewAllPaginator::new(store, fake.as_gateway(), Tunables::default());

    block_on(paginator.open("Invoices", 1));
    block_on(paginator.open("Invoices", 2));
    block_on(paginator.open("Invoices", 1));
    assert_eq!(fake.count(|c| matches!(c, Call::Page(..))), 3);
}

#[test]
fn unknown_section_is_registered_from_page_config() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(1, 1, 2)));
    let store = SectionStore::new(fake.as_gateway());
    let paginator = ViewAllPaginator::new(store.clone(), fake.as_gateway(), Tunables::default());

    block_on(paginator.open("Archive", 1));
    assert_eq!(store.get("Archive").unwrap().rows.len(), 2);
    assert_eq!(paginator.state().unwrap().controls(5), None);
}

#[test]
fn empty_page_has_dedicated_phase() {
    let fake = FakeGateway::new();
    fake.push_page(Ok(page_body(1, 1, 0)));
    let store = SectionStore::new(fake.as_gateway());
    let paginator = ViewAllPaginator::new(store, fake.as_gateway(), Tunables::default());
    block_on(paginator.open("Invoices", 1));
    assert_eq!(paginator.state().unwrap().phase, ViewAllPhase::Empty);
}

#[test]
fn failure_stays_in_modal_and_reload_retries() {
    let fake = FakeGateway::new();
    fake.push_page(Err(GatewayError::application("Section not available")));
    fake.push_page(Ok(page_body(3, 5, 2)));
    let store = SectionStore::new(fake.as_gateway());
    store.register_payload("Invoices", payload(2));
    let paginator = ViewAllPaginator::new(store.clone(), fake.as_gateway(), Tunables::default());

    block_on(paginator.open("Invoices", 3));
    assert_eq!(paginator.state().unwrap().phase, ViewAllPhase::Failed("Section not available".to_owned()));
    assert_eq!(store.get("Invoices").unwrap().rows.len(), 2);

    block_on(paginator.reload());
    assert_eq!(fake.calls(), vec![Call::Page("Invoices".to_owned(), 3), Call::Page("Invoices".to_owned(), 3)]);
    assert_eq!(paginator.state().unwrap().phase, ViewAllPhase::Loaded);

    paginator.close();
    assert_eq!(paginator.state(), None);
}
