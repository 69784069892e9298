//! The remote-data seam between the dashboard core and the server.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every component talks to the backend only through [`Gateway`]. The browser
//! build plugs in [`super::api::HttpGateway`]; tests plug in a scripted fake.
//! Futures are `?Send` because the page runs on a single event loop.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::types::{FieldSpec, LoadMoreBody, SearchBody, SectionPageBody, SelectOption};
use crate::error::GatewayError;

/// Remote operations the dashboard core depends on.
///
/// Implementations carry the page identity and CSRF token themselves, so
/// callers only name sections, records and fields.
#[async_trait(?Send)]
pub trait Gateway {
    /// Fetch the next batch of sections starting at `start_index`.
    async fn load_more(&self, start_index: usize) -> Result<LoadMoreBody, GatewayError>;

    /// Search every section of the page for `query`.
    async fn search(&self, query: &str) -> Result<SearchBody, GatewayError>;

    /// Fetch the editable field metadata of a section.
    async fn fetch_fields(&self, section: &str) -> Result<Vec<FieldSpec>, GatewayError>;

    /// Fetch the current field values of one record.
    async fn fetch_record(&self, section: &str, record_id: &str) -> Result<Map<String, Value>, GatewayError>;

    /// Create (`record_id = None`) or update a record. Returns the server's
    /// confirmation message, if any.
    async fn submit_record(
        &self,
        section: &str,
        record_id: Option<&str>,
        values: &Map<String, Value>,
    ) -> Result<Option<String>, GatewayError>;

    /// Fetch one page of a section's records with its pagination cursor.
    async fn fetch_page(&self, section: &str, page_number: u32) -> Result<SectionPageBody, GatewayError>;

    /// Fetch the options of a foreign-key backed select field.
    async fn fetch_fk_options(&self, field: &str) -> Result<Vec<SelectOption>, GatewayError>;
}
