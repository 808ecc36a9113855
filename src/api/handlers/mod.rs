//! API handlers and shared utilities for FocusMate.
//!
//! This module organizes the route handlers and provides the helpers record
//! handlers share: id parsing, text and date validation, and the success
//! envelope.

pub mod auth;
pub mod error;
pub mod health;
pub mod journal;
pub mod moods;
pub mod root;
pub mod tasks;
#[cfg(test)]
pub(crate) mod test_support;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use error::ApiError;

/// Success envelope for record routes: `{success: true, data}`.
#[derive(Serialize, Debug)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Keep an explicit JSON `null` apart from an omitted field.
///
/// Use with `#[serde(default, deserialize_with = ...)]`: omitted stays `None`,
/// `null` becomes `Some(None)`.
pub(crate) fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Parse a record id from the path, reporting `Invalid <kind> ID` on failure.
pub(crate) fn parse_record_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::Validation(format!("Invalid {kind} ID")))
}

/// Required text: trimmed and non-empty.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    optional_text(value, field)?
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

/// Text that may be omitted, but must not be blank when supplied.
pub(crate) fn optional_text(
    value: Option<String>,
    field: &str,
) -> Result<Option<String>, ApiError> {
    match value.map(|text| text.trim().to_string()) {
        Some(text) if text.is_empty() => {
            Err(ApiError::Validation(format!("{field} is required")))
        }
        other => Ok(other),
    }
}

/// Parse a client-supplied date.
///
/// Accepts RFC 3339 timestamps, `datetime-local` values (`2025-01-31T09:30`,
/// interpreted as UTC) and plain dates. An empty string means "no date".
pub(crate) fn parse_client_date(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(parsed.and_utc()));
        }
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc()));
    }

    Err(ApiError::Validation(format!("Invalid {field}")))
}
