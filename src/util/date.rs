use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::borrow::Cow;

const COMMON_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S %z", // Common format with timezone
    "%Y-%m-%dT%H:%M:%S%z",  // ISO-8601 with compact offset
    "%Y-%m-%dT%H:%M:%S%.f%z", // ISO-8601 with fractional seconds and compact offset
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S", // Common format without timezone
    "%Y-%m-%dT%H:%M:%S", // ISO-8601 without offset
];

/// Parses a feed `pubDate` value.
///
/// Tries RFC 2822 (the RSS 2.0 format), then RFC 3339, then a handful of common
/// variants seen in the wild. Times without an offset are taken as UTC and date-only
/// values as midnight UTC.
///
/// Returns `None` for anything else. Callers decide what an unparsable date means.
pub fn parse_pub_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed);
    }

    if let Some(parsed) = parse_loose_rfc2822(text) {
        return Some(parsed);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }

    for fmt in COMMON_DATE_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(text, fmt) {
            return Some(parsed);
        }
    }

    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(parsed.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
}

/// RFC 2822 as feeds actually write it.
///
/// chrono rejects a weekday that disagrees with the date, full weekday names and a
/// `UTC` zone. The weekday carries nothing the date doesn't, so it is dropped, and
/// `UTC` becomes `+0000`.
fn parse_loose_rfc2822(text: &str) -> Option<DateTime<FixedOffset>> {
    let without_weekday = match text.split_once(',') {
        Some((weekday, rest)) if weekday.chars().all(|c| c.is_ascii_alphabetic()) => {
            rest.trim_start()
        }
        _ => text,
    };

    let normalized = match without_weekday.strip_suffix(" UTC") {
        Some(head) => Cow::Owned(format!("{} +0000", head)),
        None => Cow::Borrowed(without_weekday),
    };

    DateTime::parse_from_rfc2822(&normalized).ok()
}
