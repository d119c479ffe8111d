use std::time::SystemTime;

use serde::{Deserialize, Deserializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Appointment payloads.
pub mod appointment;
/// Registration, login and user payloads.
pub mod auth;
/// Payloads shared across routes.
pub mod common;
/// Health-check payload.
pub mod health;
/// Clinical note payloads.
pub mod note;
/// Patient payloads and search query.
pub mod patient;
/// Photo payloads.
pub mod photo;
pub mod validation;
/// Vital-sign payloads.
pub mod vital;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp into a [`SystemTime`].
pub fn parse_rfc3339(value: &str) -> Option<SystemTime> {
    OffsetDateTime::parse(value.trim(), &Rfc3339)
        .ok()
        .map(SystemTime::from)
}

/// Trim an optional free-text field, mapping blank strings to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// `deserialize_with` helper trimming a string before validation sees it.
pub(crate) fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|text| text.trim().to_owned())
}

/// `deserialize_with` helper for optional text: trimmed, blank becomes `None`.
pub(crate) fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(normalize_optional)
}
