//! Capture and verification timestamp handling
//!
//! Capture dates come from camera metadata and are naive local times with
//! second precision. Cameras write them in several shapes (EXIF uses colons
//! in the date part, some tools append an offset or a NUL terminator), and
//! clocks that were never set produce dates that are plainly wrong. Those
//! are dropped instead of treated as damage to the inventory.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;

/// On-disk form of a capture date.
pub const CAPTURED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capture dates before this year predate the collection and are ignored.
pub const EARLIEST_PLAUSIBLE_YEAR: i32 = 1998;

static CAPTURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})[:-](\d{2})[:-](\d{2})[T ](\d{2}):(\d{2}):(\d{2})(?:Z|[+-]\d{2}:?\d{2})?\x00?$",
    )
    .unwrap()
});

/// Result of interpreting a capture date string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureDate {
    Valid(NaiveDateTime),
    /// Well-shaped but outside the plausible range
    Implausible,
    Malformed,
}

/// Interpret a capture date in any of the accepted shapes.
pub fn parse_captured_at(value: &str) -> CaptureDate {
    parse_captured_at_with_year(value, Local::now().year())
}

pub(crate) fn parse_captured_at_with_year(value: &str, current_year: i32) -> CaptureDate {
    let Some(caps) = CAPTURE_PATTERN.captures(value.trim_start()) else {
        return CaptureDate::Malformed;
    };
    let field = |idx: usize| -> u32 { caps[idx].parse().unwrap_or(0) };
    let year: i32 = caps[1].parse().unwrap_or(0);

    if !(EARLIEST_PLAUSIBLE_YEAR..=current_year).contains(&year) {
        return CaptureDate::Implausible;
    }

    NaiveDate::from_ymd_opt(year, field(2), field(3))
        .and_then(|date| date.and_hms_opt(field(4), field(5), field(6)))
        .map_or(CaptureDate::Malformed, CaptureDate::Valid)
}

pub fn format_captured_at(value: &NaiveDateTime) -> String {
    value.format(CAPTURED_FORMAT).to_string()
}

/// Parse a verification timestamp: RFC 3339, or a bare
/// `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_verified_at(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, CAPTURED_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_verified_at(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
