//! Time helpers shared by the services and importers.

use chrono::{DateTime, NaiveDate, Utc};

pub const APP_NAME: &str = "folio_backend";

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Normalizes the date formats found in feeds to an ISO-8601 calendar date.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 and RFC 2822 timestamps. Anything else
/// yields `None`.
pub fn normalize_feed_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    None
}
