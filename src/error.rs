//! Error taxonomy shared by the dashboard components.
//!
//! ERROR HANDLING
//! ==============
//! Remote failures collapse into [`GatewayError`] (transport vs. application)
//! and are converted into inline messages at each component boundary. Nothing
//! here is fatal to the page; every variant is recoverable by re-triggering
//! the user action.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use std::collections::BTreeMap;

/// Failure of a remote call made through the gateway.
///
/// `Clone` so a shared in-flight fetch can hand the same failure to every
/// waiter.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network failure, non-2xx status or an undecodable body.
    #[error("{0}")]
    Transport(String),

    /// The server answered `success: false`.
    #[error("{message}")]
    Application {
        message: String,
        /// Per-field messages reported alongside the failure, if any.
        field_errors: BTreeMap<String, String>,
    },
}

impl GatewayError {
    /// Build an application failure without field-level detail.
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application { message: message.into(), field_errors: BTreeMap::new() }
    }

    /// Field-level messages, empty for transport failures.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Transport(_) => None,
            Self::Application { field_errors, .. } => Some(field_errors),
        }
    }
}

/// Lookup failure in the section registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No section is registered under this name (case-insensitive).
    #[error("section not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by the record editor.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("could not load the form fields: {0}")]
    SchemaLoadFailed(String),

    #[error("could not load the record: {0}")]
    RecordLoadFailed(String),

    /// Client-side validation blocked submission.
    #[error("{0} field(s) need attention")]
    ValidationFailed(usize),

    /// The server rejected the submission.
    #[error("save failed: {0}")]
    SaveRejected(String),
}

impl FormError {
    /// Whether the form can still be edited and resubmitted after this error.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::ValidationFailed(_) | Self::SaveRejected(_))
    }
}
