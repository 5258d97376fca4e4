//! Timestamp format detection and sampling-period inference.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::TimestampFormat;

// =============================================================================
// CANDIDATE FORMATS
// =============================================================================
// Tried in order; the first format that parses every non-missing value wins,
// so month-first beats day-first when both would parse.

const CANDIDATE_FORMATS: &[TimestampFormat] = &[
    TimestampFormat::datetime("%Y-%m-%d %H:%M:%S"),
    TimestampFormat::datetime("%Y-%m-%dT%H:%M:%S"),
    TimestampFormat::datetime("%Y-%m-%d %H:%M:%S%.f"),
    TimestampFormat::datetime("%Y-%m-%dT%H:%M:%S%.f"),
    TimestampFormat::datetime("%Y-%m-%dT%H:%M:%SZ"),
    TimestampFormat::datetime("%Y-%m-%dT%H:%M:%S%.fZ"),
    TimestampFormat::datetime("%Y-%m-%d %H:%M"),
    TimestampFormat::datetime("%Y-%m-%dT%H:%M"),
    TimestampFormat::datetime("%Y/%m/%d %H:%M:%S"),
    TimestampFormat::datetime("%Y/%m/%d %H:%M"),
    TimestampFormat::datetime("%m/%d/%Y %H:%M:%S"),
    TimestampFormat::datetime("%m/%d/%Y %H:%M"),
    TimestampFormat::datetime("%d/%m/%Y %H:%M:%S"),
    TimestampFormat::datetime("%d/%m/%Y %H:%M"),
    TimestampFormat::datetime("%d-%m-%Y %H:%M:%S"),
    TimestampFormat::datetime("%d.%m.%Y %H:%M:%S"),
    TimestampFormat::date("%Y-%m-%d"),
    TimestampFormat::date("%Y/%m/%d"),
    TimestampFormat::date("%m/%d/%Y"),
    TimestampFormat::date("%d/%m/%Y"),
    TimestampFormat::date("%d-%m-%Y"),
    TimestampFormat::date("%d.%m.%Y"),
];

// Cheap pre-filter so numeric and free-text columns skip the format scan.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").unwrap(), // ISO date
        Regex::new(r"^\d{1,2}[-/.]\d{1,2}[-/.]\d{4}").unwrap(), // US/European date
    ]
});

/// Look up a supported format by its pattern string.
pub fn known_format(pattern: &str) -> Option<TimestampFormat> {
    CANDIDATE_FORMATS
        .iter()
        .find(|f| f.pattern() == pattern)
        .copied()
}

/// Check if a value looks like a date.
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    DATE_PATTERNS.iter().any(|pattern| pattern.is_match(trimmed))
}

/// Find the first candidate format that parses every value.
pub fn detect_format(values: &[&str]) -> Option<TimestampFormat> {
    if values.is_empty() || !values.iter().all(|v| looks_like_date(v)) {
        return None;
    }

    CANDIDATE_FORMATS
        .iter()
        .find(|format| values.iter().all(|v| format.parse(v).is_some()))
        .copied()
}

/// Parse a timestamp written in any supported format, or RFC 3339.
///
/// Used for client-supplied interval bounds, which may not use the column's format.
pub fn parse_any(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    CANDIDATE_FORMATS.iter().find_map(|f| f.parse(value))
}

/// Expected sampling period in milliseconds: the mode of the strictly positive
/// successive differences. Ties resolve to the smallest difference.
pub fn mode_period_ms(timestamps: &[NaiveDateTime]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in timestamps.windows(2) {
        let diff = (pair[1] - pair[0]).num_milliseconds();
        if diff > 0 {
            *counts.entry(diff).or_insert(0) += 1;
        }
    }

    let mut best: Option<(i64, usize)> = None;
    for (&diff, &count) in &counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((diff, count));
        }
    }
    best.map(|(diff, _)| diff)
}

/// Render a period as a compact human string (`5m`, `1h30m`, `250ms`).
pub fn format_period(ms: i64) -> String {
    if ms % 1000 != 0 {
        return format!("{}ms", ms);
    }
    let mut secs = ms / 1000;
    let mut out = String::new();
    for (unit, size) in [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    if out.is_empty() { "0s".to_string() } else { out }
}
