//! HTTP implementation of the dashboard gateway.
//!
//! Client-side (csr): real HTTP calls via `gloo-net`.
//! Native builds (tests, tooling): every call fails with a transport error
//! since these endpoints are only meaningful in the browser.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx statuses and undecodable bodies become `GatewayError::Transport`;
//! `success: false` envelopes become `GatewayError::Application`. Decoding is
//! a pure function so both paths are covered by native tests.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::gateway::Gateway;
use super::types::{
    FieldSpec, FieldsBody, FkOptionsBody, LoadMoreBody, RecordBody, SaveBody, SearchBody, SectionPageBody,
    SelectOption,
};
use crate::config::DashboardConfig;
use crate::error::GatewayError;

#[cfg(not(feature = "csr"))]
const UNAVAILABLE: &str = "not available outside the browser";

fn load_more_endpoint(page: &str) -> String {
    format!("/main/{page}/load-more/")
}

fn search_endpoint(page: &str) -> String {
    format!("/main/{page}/search/")
}

fn fields_endpoint(page: &str, section: &str) -> String {
    format!("/main/{page}/{section}/fields/")
}

fn record_endpoint(page: &str, section: &str, record_id: &str) -> String {
    format!("/main/{page}/{section}/{record_id}/edit/")
}

fn add_endpoint(page: &str, section: &str) -> String {
    format!("/main/{page}/{section}/add/")
}

fn section_page_endpoint(page: &str, section: &str, page_number: u32) -> String {
    format!("/main/{page}/{section}/data/?page={page_number}")
}

fn fk_options_endpoint(page: &str, field: &str) -> String {
    format!("/main/{page}/fk-options/{field}/")
}

fn status_failed_message(status: u16) -> String {
    format!("server returned status {status}")
}

/// Decode a JSON envelope of the form `{success, error?, errors?, ...body}`.
///
/// # Errors
///
/// Returns `Transport` for non-2xx statuses or malformed bodies, and
/// `Application` when the server reports `success: false`.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, GatewayError> {
    if !(200..300).contains(&status) {
        return Err(GatewayError::Transport(status_failed_message(status)));
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Transport(format!("malformed response: {e}")))?;
    if value.get("success").and_then(Value::as_bool) != Some(true) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or("request failed")
            .to_owned();
        return Err(GatewayError::Application { message, field_errors: field_errors(&value) });
    }
    serde_json::from_value(value).map_err(|e| GatewayError::Transport(format!("malformed response: {e}")))
}

/// Collect `errors: {field: msg | [msg, ...]}`, keeping the first message per field.
fn field_errors(value: &Value) -> BTreeMap<String, String> {
    let Some(errors) = value.get("errors").and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    errors
        .iter()
        .filter_map(|(field, detail)| {
            let message = match detail {
                Value::String(s) => Some(s.clone()),
                Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_owned),
                _ => None,
            }?;
            Some((field.clone(), message))
        })
        .collect()
}

/// Gateway backed by the dashboard's JSON endpoints.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    page: String,
    csrf_token: String,
}

impl HttpGateway {
    pub fn new(config: &DashboardConfig) -> Self {
        Self { page: config.page.clone(), csrf_token: config.csrf_token.clone() }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        #[cfg(feature = "csr")]
        {
            let resp = gloo_net::http::Request::get(url)
                .header("X-CSRFToken", &self.csrf_token)
                .header("X-Requested-With", "XMLHttpRequest")
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            let status = resp.status();
            let body = resp.text().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
            decode_response(status, &body)
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (url, &self.csrf_token);
            Err(GatewayError::Transport(UNAVAILABLE.to_owned()))
        }
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, payload: &B) -> Result<T, GatewayError> {
        #[cfg(feature = "csr")]
        {
            let resp = gloo_net::http::Request::post(url)
                .header("X-CSRFToken", &self.csrf_token)
                .header("X-Requested-With", "XMLHttpRequest")
                .json(payload)
                .map_err(|e| GatewayError::Transport(e.to_string()))?
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;
            let status = resp.status();
            let body = resp.text().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
            decode_response(status, &body)
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (url, payload, &self.csrf_token);
            Err(GatewayError::Transport(UNAVAILABLE.to_owned()))
        }
    }
}

#[async_trait(?Send)]
impl Gateway for HttpGateway {
    async fn load_more(&self, start_index: usize) -> Result<LoadMoreBody, GatewayError> {
        let payload = serde_json::json!({ "start_index": start_index });
        self.post_json(&load_more_endpoint(&self.page), &payload).await
    }

    async fn search(&self, query: &str) -> Result<SearchBody, GatewayError> {
        let payload = serde_json::json!({ "query": query });
        self.post_json(&search_endpoint(&self.page), &payload).await
    }

    async fn fetch_fields(&self, section: &str) -> Result<Vec<FieldSpec>, GatewayError> {
        let body: FieldsBody = self.get_json(&fields_endpoint(&self.page, section)).await?;
        Ok(body.fields)
    }

    async fn fetch_record(&self, section: &str, record_id: &str) -> Result<Map<String, Value>, GatewayError> {
        let body: RecordBody = self.get_json(&record_endpoint(&self.page, section, record_id)).await?;
        Ok(body.data)
    }

    async fn submit_record(
        &self,
        section: &str,
        record_id: Option<&str>,
        values: &Map<String, Value>,
    ) -> Result<Option<String>, GatewayError> {
        let url = match record_id {
            Some(id) => record_endpoint(&self.page, section, id),
            None => add_endpoint(&self.page, section),
        };
        let body: SaveBody = self.post_json(&url, values).await?;
        Ok(body.message)
    }

    async fn fetch_page(&self, section: &str, page_number: u32) -> Result<SectionPageBody, GatewayError> {
        self.get_json(&section_page_endpoint(&self.page, section, page_number)).await
    }

    async fn fetch_fk_options(&self, field: &str) -> Result<Vec<SelectOption>, GatewayError> {
        let body: FkOptionsBody = self.get_json(&fk_options_endpoint(&self.page, field)).await?;
        Ok(body.options)
    }
}
