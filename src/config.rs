//! Dashboard configuration parsed from the server-rendered bootstrap.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page embeds a JSON document describing the page identity, the CSRF
//! token, the first batch of sections and the progressive-load cursor. This
//! module turns it into an immutable [`DashboardConfig`] that is threaded
//! through component constructors, plus the initial load state.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use serde::Deserialize;

use crate::net::types::{SectionPayload, deserialize_ordered_entries};

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u32 = 300;
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_SEARCH_PREVIEW_LIMIT: usize = 5;
pub const DEFAULT_AUTO_LOAD_THRESHOLD: usize = 4;
pub const DEFAULT_AUTO_LOAD_DELAY_MS: u32 = 1000;
pub const DEFAULT_SAVE_CLOSE_DELAY_MS: u32 = 1500;
pub const DEFAULT_NOTICE_TTL_MS: u32 = 4000;
pub const DEFAULT_PAGE_WINDOW: u32 = 5;

/// Errors produced while reading the bootstrap document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The bootstrap JSON could not be decoded.
    #[error("bootstrap parse failed: {0}")]
    Parse(String),

    /// The bootstrap does not name the page.
    #[error("bootstrap is missing the page identity")]
    MissingPage,

    /// A tunable holds an unusable value.
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Behaviour knobs with production defaults; any may be overridden by the
/// bootstrap `settings` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Quiet period before a typed query is sent.
    pub search_debounce_ms: u32,
    /// Queries shorter than this (after trimming) never reach the server.
    pub min_query_len: usize,
    /// Records shown per section in the search panel.
    pub search_preview_limit: usize,
    /// The loader self-triggers once when fewer sections than this arrived at bootstrap.
    pub auto_load_threshold: usize,
    pub auto_load_delay_ms: u32,
    /// Delay between a successful save and the modal closing.
    pub save_close_delay_ms: u32,
    /// Lifetime of transient notices.
    pub notice_ttl_ms: u32,
    /// Maximum page-number buttons in the paginator.
    pub page_window: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            search_preview_limit: DEFAULT_SEARCH_PREVIEW_LIMIT,
            auto_load_threshold: DEFAULT_AUTO_LOAD_THRESHOLD,
            auto_load_delay_ms: DEFAULT_AUTO_LOAD_DELAY_MS,
            save_close_delay_ms: DEFAULT_SAVE_CLOSE_DELAY_MS,
            notice_ttl_ms: DEFAULT_NOTICE_TTL_MS,
            page_window: DEFAULT_PAGE_WINDOW,
        }
    }
}

impl Tunables {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.search_debounce_ms))
    }

    pub fn auto_load_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.auto_load_delay_ms))
    }

    pub fn save_close_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.save_close_delay_ms))
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(u64::from(self.notice_ttl_ms))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_query_len == 0 {
            return Err(ConfigError::Invalid { key: "min_query_len", reason: "must be at least 1".to_owned() });
        }
        if self.search_preview_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "search_preview_limit",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.page_window == 0 {
            return Err(ConfigError::Invalid { key: "page_window", reason: "must be at least 1".to_owned() });
        }
        Ok(())
    }
}

/// Immutable per-page configuration shared by every component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Page identity used in every endpoint path.
    pub page: String,
    /// Sent as `X-CSRFToken` on every request.
    pub csrf_token: String,
    pub tunables: Tunables,
}

impl DashboardConfig {
    pub fn new(page: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self { page: page.into(), csrf_token: csrf_token.into(), tunables: Tunables::default() }
    }
}

/// Everything the server rendered into the page at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub config: DashboardConfig,
    /// Sections delivered with the page, in display order.
    pub sections: Vec<(String, SectionPayload)>,
    /// Index of the first section not yet delivered.
    pub next_section_index: usize,
    pub has_more_sections: bool,
}

#[derive(Deserialize)]
struct BootstrapDoc {
    #[serde(default)]
    page: String,
    #[serde(default)]
    csrf_token: String,
    #[serde(default, deserialize_with = "deserialize_ordered_entries")]
    sections: Vec<(String, SectionPayload)>,
    #[serde(default)]
    next_section_index: Option<usize>,
    #[serde(default)]
    has_more_sections: bool,
    #[serde(default)]
    settings: Tunables,
}

impl Bootstrap {
    /// Parse the bootstrap JSON document.
    ///
    /// Required:
    /// - `page`
    ///
    /// Optional:
    /// - `csrf_token` (empty when absent)
    /// - `sections`: ordered map of section payloads
    /// - `next_section_index`: defaults to the number of delivered sections
    /// - `has_more_sections`: default `false`
    /// - `settings`: overrides for [`Tunables`]
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed, the page is missing,
    /// or a tunable is out of range.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let doc: BootstrapDoc = serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let page = doc.page.trim().to_owned();
        if page.is_empty() {
            return Err(ConfigError::MissingPage);
        }
        doc.settings.validate()?;
        let next_section_index = doc.next_section_index.unwrap_or(doc.sections.len());
        Ok(Self {
            config: DashboardConfig { page, csrf_token: doc.csrf_token, tunables: doc.settings },
            sections: doc.sections,
            next_section_index,
            has_more_sections: doc.has_more_sections,
        })
    }

    /// A bootstrap with no delivered sections; the loader starts from index 0.
    pub fn empty(page: impl Into<String>) -> Self {
        Self {
            config: DashboardConfig::new(page, ""),
            sections: Vec::new(),
            next_section_index: 0,
            has_more_sections: true,
        }
    }
}
