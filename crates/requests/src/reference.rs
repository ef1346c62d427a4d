//! Human-readable record references such as `TXN-1718000000000-3F9A1C`.

use chrono::{DateTime, Utc};

/// `<prefix>-<unix millis>-<6 upper-case hex chars taken from the record id>`.
pub fn reference(prefix: &str, record_id: impl core::fmt::Display, now: DateTime<Utc>) -> String {
    let hex: String = record_id
        .to_string()
        .chars()
        .filter(char::is_ascii_hexdigit)
        .collect();
    let tail = &hex[hex.len().saturating_sub(6)..];
    format!("{prefix}-{}-{}", now.timestamp_millis(), tail.to_ascii_uppercase())
}
