//! Small utility helpers used across modules.

use chrono::{NaiveDate, Utc};

/// The calendar day every daily-challenge record is keyed on: wall clock
/// normalized to the UTC calendar date, so "today" does not depend on the
/// server's local timezone.
pub fn today_utc() -> NaiveDate {
  Utc::now().date_naive()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}
