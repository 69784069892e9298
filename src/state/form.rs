//! Schema-driven add/edit record editor.
//!
//! SYSTEM CONTEXT
//! ==============
//! One editor session at a time backs the record modal. A session resolves
//! the section's field schema (shared cache) and, when editing, the record's
//! current values; both fetches run concurrently. The modal renders from the
//! [`FormState`] snapshot and feeds edits back through the engine.
//!
//! DESIGN
//! ======
//! `FormState` is plain data with all validation and serialization rules so
//! it can be tested without a gateway. `RecordFormEngine` owns the async
//! flow: loading, foreign-key option follow-ups and submission. A save only
//! marks the section stale; refetching its rows runs separately.
//!
//! ERROR HANDLING
//! ==============
//! Load failures park the session in `LoadFailed` with a retry path. Save
//! failures return the session to `Editing` with the entered values intact and
//! any per-field server messages attached.

#[cfg(test)]
#[path = "form_test.rs"]
mod form_test;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use chrono::DateTime;
use futures::future::join_all;
use serde_json::{Map, Value};

use super::schema::{Field, FieldKind, FieldSchema};
use super::sections::SectionStore;
use super::validate::{FieldIssue, validate_field};
use crate::error::{FormError, GatewayError};
use crate::net::gateway::Gateway;
use crate::net::types::{SelectOption, value_to_string};
use crate::util::cancel::{CancelSlot, CancelToken};
use crate::util::notify::Notifier;

pub const DEFAULT_SAVED_NOTICE: &str = "Record saved successfully.";

/// Current value of one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Checkbox state.
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Flag(flag) => flag.to_string(),
        }
    }

    pub fn is_checked(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => parse_flag_text(text),
        }
    }
}

/// Add a new record, or edit an existing one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { record_id: String },
}

impl FormMode {
    pub fn record_id(&self) -> Option<&str> {
        match self {
            Self::Add => None,
            Self::Edit { record_id } => Some(record_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormPhase {
    /// Schema or record still in flight.
    Loading,
    /// Schema or record failed; `retry` re-runs the fetch.
    LoadFailed,
    Editing,
    Submitting,
    Saved,
}

/// Visual validation state of one input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldVisual {
    /// Not yet edited; no validation shown.
    Pristine,
    Valid,
    Invalid,
}

/// Snapshot of one editor session.
#[derive(Clone, Debug)]
pub struct FormState {
    /// Distinguishes sessions so delayed UI work can target the right one.
    pub session: u64,
    pub section: String,
    pub mode: FormMode,
    pub phase: FormPhase,
    pub error: Option<FormError>,
    /// Success message shown after a save.
    pub notice: Option<String>,
    schema: Option<Rc<FieldSchema>>,
    values: HashMap<String, FieldValue>,
    touched: HashSet<String>,
    server_errors: BTreeMap<String, String>,
    fk_options: HashMap<String, Vec<SelectOption>>,
    /// Failed foreign-key option fetches, by field.
    fk_errors: HashMap<String, String>,
}

impl FormState {
    pub fn new(session: u64, section: impl Into<String>, mode: FormMode) -> Self {
        Self {
            session,
            section: section.into(),
            mode,
            phase: FormPhase::Loading,
            error: None,
            notice: None,
            schema: None,
            values: HashMap::new(),
            touched: HashSet::new(),
            server_errors: BTreeMap::new(),
            fk_options: HashMap::new(),
            fk_errors: HashMap::new(),
        }
    }

    pub fn is_add(&self) -> bool {
        self.mode == FormMode::Add
    }

    pub fn fields(&self) -> &[Field] {
        self.schema.as_deref().map_or(&[][..], FieldSchema::fields)
    }

    /// Install the resolved schema and record values; the session becomes
    /// editable. Add sessions start from declared defaults.
    pub fn apply_loaded(&mut self, schema: Rc<FieldSchema>, record: Option<&Map<String, Value>>) {
        self.values = schema
            .fields()
            .iter()
            .map(|field| {
                let value = match (record, &field.default) {
                    (Some(record), _) => record.get(&field.name).map(|v| normalize_value(field, v)),
                    (None, Some(default)) => Some(normalize_value(field, default)),
                    (None, None) => None,
                };
                (field.name.clone(), value.unwrap_or_else(|| empty_value(field)))
            })
            .collect();
        self.schema = Some(schema);
        self.touched.clear();
        self.server_errors.clear();
        self.phase = FormPhase::Editing;
        self.error = None;
    }

    pub fn fail_load(&mut self, error: FormError) {
        self.phase = FormPhase::LoadFailed;
        self.error = Some(error);
    }

    pub fn value(&self, name: &str) -> FieldValue {
        match self.values.get(name) {
            Some(value) => value.clone(),
            None => match self.schema.as_ref().and_then(|s| s.field(name)) {
                Some(field) => empty_value(field),
                None => FieldValue::Text(String::new()),
            },
        }
    }

    /// Record an edit. Clears the field's server error.
    pub fn set_value(&mut self, name: &str, value: FieldValue) {
        self.touched.insert(name.to_owned());
        self.server_errors.remove(name);
        self.values.insert(name.to_owned(), value);
        if matches!(self.error, Some(FormError::ValidationFailed(_))) {
            let remaining = self.issues().len();
            self.error = (remaining > 0).then_some(FormError::ValidationFailed(remaining));
        }
    }

    pub fn issue(&self, name: &str) -> Option<FieldIssue> {
        let field = self.schema.as_ref()?.field(name)?;
        validate_field(field, &self.value(name)).err()
    }

    /// Every failing field, in schema order.
    pub fn issues(&self) -> Vec<(String, FieldIssue)> {
        self.fields()
            .iter()
            .filter_map(|field| {
                validate_field(field, &self.value(&field.name)).err().map(|issue| (field.name.clone(), issue))
            })
            .collect()
    }

    pub fn visual(&self, name: &str) -> FieldVisual {
        if self.server_errors.contains_key(name) {
            return FieldVisual::Invalid;
        }
        if !self.touched.contains(name) {
            return FieldVisual::Pristine;
        }
        if self.issue(name).is_some() { FieldVisual::Invalid } else { FieldVisual::Valid }
    }

    /// Message to show under an input: the server's, else the client check
    /// once the field has been touched.
    pub fn field_message(&self, name: &str) -> Option<String> {
        if let Some(message) = self.server_errors.get(name) {
            return Some(message.clone());
        }
        if !self.touched.contains(name) {
            return None;
        }
        self.issue(name).map(|issue| issue.to_string())
    }

    pub fn can_save(&self) -> bool {
        self.phase == FormPhase::Editing && self.schema.is_some() && self.issues().is_empty()
    }

    /// Select options with the sentinel first and any fetched FK options.
    pub fn select_options(&self, name: &str) -> Vec<SelectOption> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.field(name))
            .map(|field| field.select_options(self.fk_options.get(name).map(Vec::as_slice)))
            .unwrap_or_default()
    }

    pub fn set_fk_options(&mut self, name: &str, options: Vec<SelectOption>) {
        self.fk_errors.remove(name);
        self.fk_options.insert(name.to_owned(), options);
    }

    /// Record a failed option fetch; the field stays pending for a retry.
    pub fn set_fk_error(&mut self, name: &str, error: impl Into<String>) {
        self.fk_errors.insert(name.to_owned(), error.into());
    }

    /// Why `name`'s options could not be loaded, if they could not.
    pub fn options_error(&self, name: &str) -> Option<&str> {
        self.fk_errors.get(name).map(String::as_str)
    }

    /// Foreign-key selects that arrived empty and have not been filled yet.
    pub fn pending_option_fields(&self) -> Vec<String> {
        self.fields()
            .iter()
            .filter(|field| field.needs_option_fetch() && !self.fk_options.contains_key(&field.name))
            .map(|field| field.name.clone())
            .collect()
    }

    /// Field → value map for submission. Checkboxes always serialize as a
    /// boolean, `false` when unchecked or missing.
    pub fn serialize(&self) -> Map<String, Value> {
        self.fields()
            .iter()
            .map(|field| {
                let value = self.value(&field.name);
                let json = match field.kind {
                    FieldKind::Checkbox => Value::Bool(value.is_checked()),
                    _ => Value::String(value.as_text()),
                };
                (field.name.clone(), json)
            })
            .collect()
    }

    /// Validate and move to `Submitting`, returning the payload.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` with the failing-field count; every field is then
    /// marked touched so its message shows.
    pub fn begin_submit(&mut self) -> Result<Map<String, Value>, FormError> {
        let issues = self.issues();
        if !issues.is_empty() {
            let names: Vec<String> = self.fields().iter().map(|f| f.name.clone()).collect();
            self.touched.extend(names);
            let error = FormError::ValidationFailed(issues.len());
            self.error = Some(error.clone());
            return Err(error);
        }
        self.phase = FormPhase::Submitting;
        self.error = None;
        self.notice = None;
        Ok(self.serialize())
    }

    /// Apply the server's answer to a submission.
    pub fn finish_submit(&mut self, result: Result<Option<String>, GatewayError>) {
        match result {
            Ok(message) => {
                self.phase = FormPhase::Saved;
                self.notice = Some(message.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| DEFAULT_SAVED_NOTICE.to_owned()));
                self.server_errors.clear();
            }
            Err(err) => {
                self.phase = FormPhase::Editing;
                self.server_errors = err.field_errors().cloned().unwrap_or_default();
                self.error = Some(FormError::SaveRejected(err.to_string()));
            }
        }
    }
}

fn empty_value(field: &Field) -> FieldValue {
    match field.kind {
        FieldKind::Checkbox => FieldValue::Flag(false),
        _ => FieldValue::Text(String::new()),
    }
}

fn parse_flag_text(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes")
}

/// Convert a server value into the form a field's widget expects.
pub fn normalize_value(field: &Field, value: &Value) -> FieldValue {
    match (&field.kind, value) {
        (FieldKind::Checkbox, Value::Bool(flag)) => FieldValue::Flag(*flag),
        (FieldKind::Checkbox, Value::Number(n)) => FieldValue::Flag(n.as_f64().is_some_and(|n| n != 0.0)),
        (FieldKind::Checkbox, Value::String(text)) => FieldValue::Flag(parse_flag_text(text)),
        (FieldKind::Checkbox, _) => FieldValue::Flag(false),
        (FieldKind::DateTime, Value::String(text)) => FieldValue::Text(datetime_local(text)),
        (FieldKind::Date, Value::String(text)) => {
            FieldValue::Text(text.split(['T', ' ']).next().unwrap_or_default().to_owned())
        }
        (FieldKind::Time, Value::String(text)) => {
            FieldValue::Text(text.split('.').next().unwrap_or_default().to_owned())
        }
        (_, other) => FieldValue::Text(value_to_string(other)),
    }
}

/// Reduce an RFC 3339 or `YYYY-MM-DD HH:MM:SS` timestamp to the
/// `YYYY-MM-DDTHH:MM` form a `datetime-local` input accepts.
fn datetime_local(text: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return parsed.naive_local().format("%Y-%m-%dT%H:%M").to_string();
    }
    let normalized = text.trim().replacen(' ', "T", 1);
    match normalized.get(..16) {
        Some(prefix) if super::validate::parse_datetime_local(prefix).is_some() => prefix.to_owned(),
        _ => text.to_owned(),
    }
}

/// Drives editor sessions against the gateway.
#[derive(Clone)]
pub struct RecordFormEngine {
    store: SectionStore,
    gateway: Rc<dyn Gateway>,
    state: Rc<RefCell<Option<FormState>>>,
    cancel: CancelSlot,
    token: Rc<RefCell<Option<CancelToken>>>,
    sessions: Rc<Cell<u64>>,
    notifier: Notifier,
}

impl RecordFormEngine {
    pub fn new(store: SectionStore, gateway: Rc<dyn Gateway>) -> Self {
        let notifier = store.notifier();
        Self {
            store,
            gateway,
            state: Rc::new(RefCell::new(None)),
            cancel: CancelSlot::new(),
            token: Rc::new(RefCell::new(None)),
            sessions: Rc::new(Cell::new(0)),
            notifier,
        }
    }

    /// Snapshot of the active session, if any.
    pub fn state(&self) -> Option<FormState> {
        self.state.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Open a session in the loading state, replacing any previous one.
    /// Returns the session id.
    pub fn open(&self, section: &str, mode: FormMode) -> u64 {
        let session = self.sessions.get() + 1;
        self.sessions.set(session);
        *self.token.borrow_mut() = Some(self.cancel.issue());
        log::debug!("opening {mode:?} form for {section}");
        *self.state.borrow_mut() = Some(FormState::new(session, section, mode));
        self.notifier.notify();
        session
    }

    /// Open a session and resolve its schema and record.
    pub async fn open_and_load(&self, section: &str, mode: FormMode) -> u64 {
        let session = self.open(section, mode);
        self.load().await;
        session
    }

    /// Re-run the schema and record fetch of a failed session.
    pub async fn retry(&self) {
        let retryable = self.update(|state| {
            if state.phase != FormPhase::LoadFailed {
                return false;
            }
            state.phase = FormPhase::Loading;
            state.error = None;
            true
        });
        if retryable == Some(true) {
            self.load().await;
        }
    }

    /// Fetch schema and record concurrently, then any empty FK option lists.
    pub async fn load(&self) {
        let Some((section, mode, token)) = self.current_session() else {
            return;
        };

        let schema_fut = self.store.get_or_fetch_schema(&section);
        let record_fut = async {
            match mode.record_id() {
                Some(id) => self.gateway.fetch_record(&section, id).await.map(Some),
                None => Ok(None),
            }
        };
        let (schema, record) = futures::join!(schema_fut, record_fut);
        if token.is_cancelled() {
            log::debug!("form session for {section} closed before load finished");
            return;
        }

        let outcome = match (schema, record) {
            (Err(err), _) => Err(FormError::SchemaLoadFailed(err.to_string())),
            (Ok(_), Err(err)) => Err(FormError::RecordLoadFailed(err.to_string())),
            (Ok(schema), Ok(record)) => Ok((schema, record)),
        };
        let pending = match outcome {
            Ok((schema, record)) => self.update(|state| {
                state.apply_loaded(schema, record.as_ref());
                state.pending_option_fields()
            }),
            Err(err) => {
                log::warn!("form load failed for {section}: {err}");
                self.update(|state| state.fail_load(err));
                None
            }
        };

        if let Some(fields) = pending.filter(|f| !f.is_empty()) {
            self.load_fk_options(fields, &token).await;
        }
    }

    async fn load_fk_options(&self, fields: Vec<String>, token: &CancelToken) {
        let fetches = fields.iter().map(|name| self.gateway.fetch_fk_options(name));
        let results = join_all(fetches).await;
        if token.is_cancelled() {
            return;
        }
        self.update(|state| {
            for (name, result) in fields.iter().zip(results) {
                match result {
                    Ok(options) => state.set_fk_options(name, options),
                    Err(err) => {
                        log::warn!("could not load options for {name}: {err}");
                        state.set_fk_error(name, format!("Could not load options: {err}"));
                    }
                }
            }
        });
    }

    /// Re-fetch option lists that are still missing (after a failed fetch).
    pub async fn retry_options(&self) {
        let Some((_, _, token)) = self.current_session() else {
            return;
        };
        let pending = self.state.borrow().as_ref().map(FormState::pending_option_fields).unwrap_or_default();
        if !pending.is_empty() {
            self.load_fk_options(pending, &token).await;
        }
    }

    pub fn set_value(&self, name: &str, value: FieldValue) {
        self.update(|state| state.set_value(name, value));
    }

    /// Validate and submit the active session.
    ///
    /// On success the section is marked stale; the refetch is left to the
    /// caller ([`crate::dashboard::Dashboard::refresh_after_save`]) so the
    /// modal's close timer does not wait on it. A session that is not
    /// editable is left alone.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when client checks block the save, `SaveRejected`
    /// when the server refuses it.
    pub async fn submit(&self) -> Result<(), FormError> {
        let Some((section, mode, token)) = self.current_session() else {
            return Ok(());
        };
        let prepared = self.update(|state| {
            if state.phase != FormPhase::Editing {
                return None;
            }
            Some(state.begin_submit())
        });
        let payload = match prepared.flatten() {
            Some(Ok(payload)) => payload,
            Some(Err(err)) => return Err(err),
            None => {
                log::debug!("ignoring submit for {section}: form is not editable");
                return Ok(());
            }
        };

        let result = self.gateway.submit_record(&section, mode.record_id(), &payload).await;
        if token.is_cancelled() {
            log::debug!("form for {section} closed while saving");
        }
        let outcome = match &result {
            Ok(_) => Ok(()),
            Err(err) => Err(FormError::SaveRejected(err.to_string())),
        };
        if !token.is_cancelled() {
            self.update(|state| state.finish_submit(result));
        }

        match &outcome {
            Ok(()) => {
                if let Err(err) = self.store.mark_stale(&section) {
                    log::debug!("saved section not in store: {err}");
                }
            }
            Err(err) => log::warn!("save rejected for {section}: {err}"),
        }
        outcome
    }

    /// Close the session. Pending loads and saves are abandoned.
    pub fn close(&self) {
        self.cancel.cancel();
        *self.token.borrow_mut() = None;
        if self.state.borrow_mut().take().is_some() {
            self.notifier.notify();
        }
    }

    /// Close `session` only if it is still the active one and has saved.
    pub fn close_if_saved(&self, session: u64) {
        let saved = self
            .state
            .borrow()
            .as_ref()
            .is_some_and(|state| state.session == session && state.phase == FormPhase::Saved);
        if saved {
            self.close();
        }
    }

    fn current_session(&self) -> Option<(String, FormMode, CancelToken)> {
        let token = self.token.borrow().clone()?;
        let state = self.state.borrow();
        let state = state.as_ref()?;
        Some((state.section.clone(), state.mode.clone(), token))
    }

    /// Apply `f` to the active session and notify. Returns `None` when no
    /// session is open.
    fn update<R>(&self, f: impl FnOnce(&mut FormState) -> R) -> Option<R> {
        let out = {
            let mut slot = self.state.borrow_mut();
            slot.as_mut().map(f)
        };
        if out.is_some() {
            self.notifier.notify();
        }
        out
    }
}
