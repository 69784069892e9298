//! Scripted in-memory gateway for unit tests.
//!
//! Each operation pops its next reply from a queue. A reply is either ready
//! immediately or gated on a `oneshot` channel so a test can hold a request in
//! flight and release it later. Every call is recorded.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{Map, Value};

use crate::error::GatewayError;
use crate::net::gateway::Gateway;
use crate::net::types::{
    Column, FieldSpec, LoadMoreBody, Pagination, Record, SearchBody, SearchHit, SectionConfig, SectionPageBody,
    SectionPayload, SelectOption,
};

/// One recorded gateway call.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    LoadMore(usize),
    Search(String),
    Fields(String),
    Record(String, String),
    Submit { section: String, record_id: Option<String>, values: Map<String, Value> },
    Page(String, u32),
    FkOptions(String),
}

enum Reply<T> {
    Ready(Result<T, GatewayError>),
    Gated(oneshot::Receiver<Result<T, GatewayError>>),
}

struct Queue<T>(RefCell<VecDeque<Reply<T>>>);

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self(RefCell::new(VecDeque::new()))
    }
}

impl<T> Queue<T> {
    fn push(&self, result: Result<T, GatewayError>) {
        self.0.borrow_mut().push_back(Reply::Ready(result));
    }

    fn gate(&self) -> oneshot::Sender<Result<T, GatewayError>> {
        let (tx, rx) = oneshot::channel();
        self.0.borrow_mut().push_back(Reply::Gated(rx));
        tx
    }

    async fn next(&self, op: &str) -> Result<T, GatewayError> {
        let reply = self.0.borrow_mut().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx.await.unwrap_or_else(|_| Err(GatewayError::Transport(format!("{op} gate dropped")))),
            None => Err(GatewayError::Transport(format!("unscripted {op} call"))),
        }
    }
}

#[derive(Default)]
pub struct FakeGateway {
    calls: RefCell<Vec<Call>>,
    load_more: Queue<LoadMoreBody>,
    search: Queue<SearchBody>,
    fields: Queue<Vec<FieldSpec>>,
    record: Queue<Map<String, Value>>,
    submit: Queue<Option<String>>,
    page: Queue<SectionPageBody>,
    fk_options: Queue<Vec<SelectOption>>,
}

impl FakeGateway {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn as_gateway(self: &Rc<Self>) -> Rc<dyn Gateway> {
        Rc::clone(self) as Rc<dyn Gateway>
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| matches(call)).count()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Search(query) => Some(query.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn submitted(&self) -> Vec<Map<String, Value>> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Submit { values, .. } => Some(values.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn push_load_more(&self, result: Result<LoadMoreBody, GatewayError>) {
        self.load_more.push(result);
    }

    pub fn gate_load_more(&self) -> oneshot::Sender<Result<LoadMoreBody, GatewayError>> {
        self.load_more.gate()
    }

    pub fn push_search(&self, result: Result<SearchBody, GatewayError>) {
        self.search.push(result);
    }

    pub fn gate_search(&self) -> oneshot::Sender<Result<SearchBody, GatewayError>> {
        self.search.gate()
    }

    pub fn push_fields(&self, result: Result<Vec<FieldSpec>, GatewayError>) {
        self.fields.push(result);
    }

    pub fn gate_fields(&self) -> oneshot::Sender<Result<Vec<FieldSpec>, GatewayError>> {
        self.fields.gate()
    }

    pub fn push_record(&self, result: Result<Map<String, Value>, GatewayError>) {
        self.record.push(result);
    }

    pub fn gate_record(&self) -> oneshot::Sender<Result<Map<String, Value>, GatewayError>> {
        self.record.gate()
    }

    pub fn push_submit(&self, result: Result<Option<String>, GatewayError>) {
        self.submit.push(result);
    }

    pub fn push_page(&self, result: Result<SectionPageBody, GatewayError>) {
        self.page.push(result);
    }

    pub fn push_fk_options(&self, result: Result<Vec<SelectOption>, GatewayError>) {
        self.fk_options.push(result);
    }

    fn record_call(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl Gateway for FakeGateway {
    async fn load_more(&self, start_index: usize) -> Result<LoadMoreBody, GatewayError> {
        self.record_call(Call::LoadMore(start_index));
        self.load_more.next("load_more").await
    }

    async fn search(&self, query: &str) -> Result<SearchBody, GatewayError> {
        self.record_call(Call::Search(query.to_owned()));
        self.search.next("search").await
    }

    async fn fetch_fields(&self, section: &str) -> Result<Vec<FieldSpec>, GatewayError> {
        self.record_call(Call::Fields(section.to_owned()));
        self.fields.next("fetch_fields").await
    }

    async fn fetch_record(&self, section: &str, record_id: &str) -> Result<Map<String, Value>, GatewayError> {
        self.record_call(Call::Record(section.to_owned(), record_id.to_owned()));
        self.record.next("fetch_record").await
    }

    async fn submit_record(
        &self,
        section: &str,
        record_id: Option<&str>,
        values: &Map<String, Value>,
    ) -> Result<Option<String>, GatewayError> {
        self.record_call(Call::Submit {
            section: section.to_owned(),
            record_id: record_id.map(str::to_owned),
            values: values.clone(),
        });
        self.submit.next("submit_record").await
    }

    async fn fetch_page(&self, section: &str, page_number: u32) -> Result<SectionPageBody, GatewayError> {
        self.record_call(Call::Page(section.to_owned(), page_number));
        self.page.next("fetch_page").await
    }

    async fn fetch_fk_options(&self, field: &str) -> Result<Vec<SelectOption>, GatewayError> {
        self.record_call(Call::FkOptions(field.to_owned()));
        self.fk_options.next("fetch_fk_options").await
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn config(columns: &[(&str, &str)]) -> SectionConfig {
    SectionConfig {
        icon: "table".to_owned(),
        columns: columns
            .iter()
            .map(|(db, display)| Column { db_column: (*db).to_owned(), display_name: (*display).to_owned() })
            .collect(),
        add_button: true,
        edit_button: true,
        table: "app_table".to_owned(),
    }
}

pub fn record(pk: &str, values: Value) -> Record {
    let values = match values {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Record { pk: pk.to_owned(), values }
}

pub fn payload(rows: usize) -> SectionPayload {
    SectionPayload {
        config: config(&[("name", "Name")]),
        data: (1..=rows).map(|i| record(&i.to_string(), serde_json::json!({ "name": format!("Row {i}") }))).collect(),
        total_count: rows as u64,
        error: None,
    }
}

pub fn load_more_body(names: &[&str], has_more: bool, next_index: usize) -> LoadMoreBody {
    LoadMoreBody {
        sections: names.iter().map(|name| ((*name).to_owned(), payload(2))).collect(),
        has_more,
        next_index,
    }
}

pub fn search_body(hits: &[(&str, usize, u64)]) -> SearchBody {
    SearchBody {
        results: hits
            .iter()
            .map(|(name, rows, count)| {
                let data = (1..=*rows)
                    .map(|i| record(&i.to_string(), serde_json::json!({ "name": format!("{name} {i}") })))
                    .collect();
                ((*name).to_owned(), SearchHit { config: config(&[("name", "Name")]), data, count: *count })
            })
            .collect(),
    }
}

pub fn page_body(current_page: u32, total_pages: u32, rows: usize) -> SectionPageBody {
    SectionPageBody {
        config: config(&[("name", "Name")]),
        data: (1..=rows).map(|i| record(&format!("{current_page}-{i}"), serde_json::json!({ "name": i }))).collect(),
        pagination: Some(Pagination {
            current_page,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
            total_count: None,
        }),
    }
}

pub fn field(name: &str, kind: &str, required: bool) -> FieldSpec {
    FieldSpec { name: name.to_owned(), label: name.to_owned(), kind: kind.to_owned(), required, ..FieldSpec::default() }
}
