//! Client-side field validation mirroring the HTML input constraints.
//!
//! Advisory only: the server validates again on submit and its field errors
//! take precedence in the editor.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::form::FieldValue;
use super::schema::{Field, FieldKind};

/// Why a field value fails validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldIssue {
    #[error("This field is required.")]
    Required,

    #[error("Ensure this value has at most {max} characters.")]
    TooLong { max: u32 },

    #[error("Enter a valid email address.")]
    InvalidEmail,

    #[error("Enter a valid URL.")]
    InvalidUrl,

    #[error("Enter a number.")]
    InvalidNumber,

    #[error("Enter a multiple of {step}.")]
    StepMismatch { step: String },

    #[error("Enter a valid date (YYYY-MM-DD).")]
    InvalidDate,

    #[error("Enter a valid date and time (YYYY-MM-DD HH:MM).")]
    InvalidDateTime,

    #[error("Enter a valid time (HH:MM).")]
    InvalidTime,
}

/// Check one value against its field's constraints.
///
/// # Errors
///
/// Returns the first [`FieldIssue`] found.
pub fn validate_field(field: &Field, value: &FieldValue) -> Result<(), FieldIssue> {
    if field.kind == FieldKind::Checkbox {
        return if field.required && !value.is_checked() { Err(FieldIssue::Required) } else { Ok(()) };
    }

    let text = value.as_text();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return if field.required { Err(FieldIssue::Required) } else { Ok(()) };
    }

    if let Some(max) = field.max_length {
        if text.chars().count() > max as usize {
            return Err(FieldIssue::TooLong { max });
        }
    }

    match &field.kind {
        FieldKind::Email if !is_email(trimmed) => Err(FieldIssue::InvalidEmail),
        FieldKind::Url if !is_absolute_url(trimmed) => Err(FieldIssue::InvalidUrl),
        FieldKind::Number { step } => check_number(trimmed, step.as_deref()),
        FieldKind::Date if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err() => Err(FieldIssue::InvalidDate),
        FieldKind::DateTime if parse_datetime_local(trimmed).is_none() => Err(FieldIssue::InvalidDateTime),
        FieldKind::Time if parse_time(trimmed).is_none() => Err(FieldIssue::InvalidTime),
        _ => Ok(()),
    }
}

fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_absolute_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = value.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

fn check_number(value: &str, step: Option<&str>) -> Result<(), FieldIssue> {
    let number: f64 = value.parse().map_err(|_| FieldIssue::InvalidNumber)?;
    if !number.is_finite() {
        return Err(FieldIssue::InvalidNumber);
    }
    let Some(step_text) = step.map(str::trim).filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("any")) else {
        return Ok(());
    };
    let Ok(step) = step_text.parse::<f64>() else {
        log::debug!("ignoring unparseable step {step_text:?}");
        return Ok(());
    };
    if step <= 0.0 {
        return Ok(());
    }
    let ratio = number / step;
    let tolerance = 1e-9 * ratio.abs().max(1.0);
    if (ratio - ratio.round()).abs() > tolerance {
        return Err(FieldIssue::StepMismatch { step: step_text.to_owned() });
    }
    Ok(())
}

/// Parse the value of a `datetime-local` input (`YYYY-MM-DDTHH:MM[:SS]`).
pub fn parse_datetime_local(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parse the value of a `time` input (`HH:MM[:SS]`).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S")).ok()
}
