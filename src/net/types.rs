//! Wire DTOs for the dashboard JSON endpoints.
//!
//! DESIGN
//! ======
//! These types mirror the server payloads field-for-field. Lenient decoding
//! (numbers-or-strings for keys, ordered maps) lives here so the rest of the
//! crate only ever sees normalized values.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One displayed column of a section table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Record key holding the column value.
    pub db_column: String,
    /// Header text.
    pub display_name: String,
}

/// Section configuration as delivered by load-more, search and page responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Material icon name shown beside the section title.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Whether the section offers an "Add" action.
    #[serde(default)]
    pub add_button: bool,
    /// Whether rows offer an "Edit" action.
    #[serde(default)]
    pub edit_button: bool,
    /// Backing table name.
    #[serde(default)]
    pub table: String,
}

/// A row of display values keyed by column, plus its primary key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key, normalized to a string (the wire sends ints or strings).
    #[serde(deserialize_with = "deserialize_string_lossy")]
    pub pk: String,
    /// Remaining column values.
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

impl Record {
    /// Render the value stored under `key`, or `None` when absent or blank.
    pub fn display_value(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Bool(true) => Some("Yes".to_owned()),
            Value::Bool(false) => Some("No".to_owned()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// One section inside a load-more response (also the bootstrap shape).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SectionPayload {
    pub config: SectionConfig,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default, deserialize_with = "deserialize_u64_lossy")]
    pub total_count: u64,
    /// Per-section failure reported by the server.
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of a successful `load-more` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoadMoreBody {
    /// Delivered sections in server order.
    #[serde(default, deserialize_with = "deserialize_ordered_entries")]
    pub sections: Vec<(String, SectionPayload)>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_index: usize,
}

/// Matches for one section inside a search response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SearchHit {
    pub config: SectionConfig,
    #[serde(default)]
    pub data: Vec<Record>,
    /// Total matches in the section (may exceed `data.len()`).
    #[serde(default, deserialize_with = "deserialize_u64_lossy")]
    pub count: u64,
}

/// Body of a successful `search` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SearchBody {
    #[serde(default, deserialize_with = "deserialize_ordered_entries")]
    pub results: Vec<(String, SearchHit)>,
}

/// An option of a `select` field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(deserialize_with = "deserialize_string_lossy")]
    pub value: String,
    #[serde(deserialize_with = "deserialize_string_lossy")]
    pub label: String,
}

/// Field metadata exactly as the `fields` endpoint reports it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// Widget type tag (`text`, `email`, `datetime-local`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub help_text: String,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_opt_string_lossy")]
    pub step: Option<String>,
    /// Static `[value, label]` pairs.
    #[serde(default)]
    pub choices: Option<Vec<(Value, Value)>>,
    /// Dynamic options for foreign-key selects.
    #[serde(default)]
    pub options: Option<Vec<SelectOption>>,
    #[serde(default)]
    pub related_model: Option<String>,
    #[serde(default)]
    pub empty_label: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
}

/// Body of a successful `fields` response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldsBody {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

/// Body of a successful record fetch.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RecordBody {
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// Body of a successful save.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SaveBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Pagination cursor reported by the section data endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
    /// Total records across all pages, when the server reports it.
    #[serde(default, alias = "count")]
    pub total_count: Option<u64>,
}

/// Body of a successful section data page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SectionPageBody {
    #[serde(default)]
    pub config: SectionConfig,
    #[serde(default)]
    pub data: Vec<Record>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Body of a successful foreign-key options fetch.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FkOptionsBody {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// Render a scalar JSON value as the string a form control would hold.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn deserialize_string_lossy<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(D::Error::custom("expected string or number")),
    }
}

fn deserialize_opt_string_lossy<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(D::Error::custom("expected string or number")),
    }
}

fn deserialize_u64_lossy<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| D::Error::custom(format!("expected non-negative integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("expected integer, got {s:?}"))),
        _ => Err(D::Error::custom("expected integer")),
    }
}

/// Decode a JSON object into `(key, value)` pairs in document order.
pub(crate) fn deserialize_ordered_entries<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(EntriesVisitor(PhantomData))
}
