//! Date/time utilities for mediabox.

use chrono::DateTime;

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores times in UTC, so a 'Z' suffix is appended. Strings that
/// already parse as RFC3339 are returned unchanged.
///
/// # Returns
///
/// RFC3339 formatted string (e.g., "2024-01-15T10:30:00Z")
pub fn to_rfc3339(datetime_str: &str) -> String {
    if DateTime::parse_from_rfc3339(datetime_str).is_ok() {
        return datetime_str.to_string();
    }
    format!("{}Z", datetime_str.replace(' ', "T"))
}
