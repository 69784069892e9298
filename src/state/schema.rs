//! Field schema for the record editor, and its per-section cache.
//!
//! DESIGN
//! ======
//! The server tags each field with a widget type string. That tag is decoded
//! once into the closed [`FieldKind`] enum so rendering and validation are
//! exhaustive `match`es. Schemas are fetched at most once per section per page
//! lifetime; concurrent callers share the single in-flight request.

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::Value;

use super::sections::section_key;
use crate::error::GatewayError;
use crate::net::gateway::Gateway;
use crate::net::types::{FieldSpec, SelectOption, value_to_string};

pub const DEFAULT_EMPTY_LABEL: &str = "Select an option";

/// Where a select field's options come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectSource {
    /// Static enumeration declared by the field.
    Choices,
    /// Rows of a related model (foreign key); may need a follow-up fetch.
    Related { model: Option<String> },
}

/// Widget kind of a form field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Url,
    Textarea,
    Number { step: Option<String> },
    Checkbox,
    Select { source: SelectSource, options: Vec<SelectOption>, empty_label: String },
    Date,
    DateTime,
    Time,
}

impl FieldKind {
    fn from_spec(spec: &FieldSpec) -> Self {
        let empty_label = spec
            .empty_label
            .clone()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMPTY_LABEL.to_owned());

        if let Some(choices) = spec.choices.as_ref().filter(|c| !c.is_empty()) {
            let options = choices
                .iter()
                .map(|(value, label)| SelectOption { value: value_to_string(value), label: value_to_string(label) })
                .collect();
            return Self::Select { source: SelectSource::Choices, options, empty_label };
        }

        match spec.kind.trim().to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "url" => Self::Url,
            "textarea" => Self::Textarea,
            "number" | "integer" | "decimal" | "float" => Self::Number { step: spec.step.clone() },
            "checkbox" | "boolean" => Self::Checkbox,
            "select" | "multiselect" => {
                let source = if spec.related_model.is_some() || spec.options.is_some() {
                    SelectSource::Related { model: spec.related_model.clone() }
                } else {
                    SelectSource::Choices
                };
                Self::Select { source, options: spec.options.clone().unwrap_or_default(), empty_label }
            }
            "date" => Self::Date,
            "datetime" | "datetime-local" => Self::DateTime,
            "time" => Self::Time,
            "text" | "" => Self::Text,
            other => {
                log::debug!("unknown field type {other:?} for {}; rendering as text", spec.name);
                Self::Text
            }
        }
    }

    /// HTML `type` attribute for `<input>`-based kinds.
    pub fn input_type(&self) -> &'static str {
        match self {
            Self::Text | Self::Textarea | Self::Select { .. } => "text",
            Self::Email => "email",
            Self::Url => "url",
            Self::Number { .. } => "number",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::DateTime => "datetime-local",
            Self::Time => "time",
        }
    }
}

/// One editable field of a section's records.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<u32>,
    pub help_text: String,
    pub default: Option<Value>,
}

impl Field {
    pub fn from_spec(spec: FieldSpec) -> Self {
        let kind = FieldKind::from_spec(&spec);
        let label = if spec.label.trim().is_empty() { humanize(&spec.name) } else { spec.label };
        Self {
            name: spec.name,
            label,
            kind,
            required: spec.required,
            max_length: spec.max_length,
            help_text: spec.help_text,
            default: spec.default,
        }
    }

    /// True for a foreign-key select that arrived without any options.
    pub fn needs_option_fetch(&self) -> bool {
        matches!(
            &self.kind,
            FieldKind::Select { source: SelectSource::Related { .. }, options, .. } if options.is_empty()
        )
    }

    /// Options to render for a select: the empty sentinel always first, then
    /// `fetched` when given, otherwise the declared options.
    pub fn select_options(&self, fetched: Option<&[SelectOption]>) -> Vec<SelectOption> {
        let FieldKind::Select { options, empty_label, .. } = &self.kind else {
            return Vec::new();
        };
        let body = fetched.unwrap_or(options);
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(SelectOption { value: String::new(), label: empty_label.clone() });
        out.extend(body.iter().filter(|o| !o.value.is_empty()).cloned());
        out
    }
}

fn humanize(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ordered field list of one section. Immutable once cached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldSchema {
    fields: Vec<Field>,
}

impl FieldSchema {
    pub fn from_specs(specs: Vec<FieldSpec>) -> Self {
        Self { fields: specs.into_iter().map(Field::from_spec).collect() }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

type SchemaFuture = Shared<LocalBoxFuture<'static, Result<Rc<FieldSchema>, GatewayError>>>;

enum SchemaSlot {
    Pending { fetch_id: u64, fut: SchemaFuture },
    Ready(Rc<FieldSchema>),
}

/// Per-section schema cache with shared in-flight fetches.
#[derive(Clone, Default)]
pub struct SchemaCache {
    slots: Rc<RefCell<HashMap<String, SchemaSlot>>>,
    next_fetch_id: Rc<Cell<u64>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached schema for `section`, if one has resolved.
    pub fn cached(&self, section: &str) -> Option<Rc<FieldSchema>> {
        match self.slots.borrow().get(&section_key(section)) {
            Some(SchemaSlot::Ready(schema)) => Some(Rc::clone(schema)),
            _ => None,
        }
    }

    /// Return the cached schema, join the in-flight fetch, or start one.
    ///
    /// A failed fetch is not cached; the next caller starts a new request.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure shared by every waiter of the fetch.
    pub async fn get_or_fetch(
        &self,
        gateway: &Rc<dyn Gateway>,
        section: &str,
    ) -> Result<Rc<FieldSchema>, GatewayError> {
        let key = section_key(section);
        let (fetch_id, fut) = {
            let mut slots = self.slots.borrow_mut();
            match slots.get(&key) {
                Some(SchemaSlot::Ready(schema)) => return Ok(Rc::clone(schema)),
                Some(SchemaSlot::Pending { fetch_id, fut }) => (*fetch_id, fut.clone()),
                None => {
                    let fetch_id = self.next_fetch_id.get().wrapping_add(1);
                    self.next_fetch_id.set(fetch_id);
                    let gateway = Rc::clone(gateway);
                    let section = section.to_owned();
                    log::debug!("fetching field schema for {section}");
                    let fut = async move {
                        let specs = gateway.fetch_fields(&section).await?;
                        Ok(Rc::new(FieldSchema::from_specs(specs)))
                    }
                    .boxed_local()
                    .shared();
                    slots.insert(key.clone(), SchemaSlot::Pending { fetch_id, fut: fut.clone() });
                    (fetch_id, fut)
                }
            }
        };

        let result = fut.await;

        let mut slots = self.slots.borrow_mut();
        let owns_slot = matches!(slots.get(&key), Some(SchemaSlot::Pending { fetch_id: id, .. }) if *id == fetch_id);
        if owns_slot {
            match &result {
                Ok(schema) => {
                    slots.insert(key, SchemaSlot::Ready(Rc::clone(schema)));
                }
                Err(err) => {
                    log::warn!("field schema fetch failed for {section}: {err}");
                    slots.remove(&key);
                }
            }
        }
        result
    }
}
