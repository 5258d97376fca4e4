//! Half-open intervals produced by the detector.

use std::fmt;
use std::ops::Range;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// What kind of anomaly an interval covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntervalKind {
    /// Missing time ticks in the timestamp column. Applies across columns.
    DatetimeGap,
    /// A run of missing cells in one column.
    ValueGap { column: String },
}

/// One end of an interval, in the interval's native domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalBound {
    Row(usize),
    Timestamp(NaiveDateTime),
}

impl fmt::Display for IntervalBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalBound::Row(row) => write!(f, "{}", row),
            IntervalBound::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A detected `[start, end)` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    /// Detector-issued identifier, unique per upload and generation.
    pub id: String,
    #[serde(flatten)]
    pub kind: IntervalKind,
    pub start: IntervalBound,
    pub end: IntervalBound,
    /// Dataset generation the interval was detected against.
    pub generation: u64,
    /// Missing ticks (datetime gaps) or missing cells (value gaps) covered.
    pub missing_count: usize,
    /// Sampling period used to lay out missing ticks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<i64>,
    /// Timestamp of the first missing row of a value gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_missing_at: Option<NaiveDateTime>,
    /// Timestamp of the last missing row of a value gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_missing_at: Option<NaiveDateTime>,
}

impl Interval {
    /// Column a value gap was detected against.
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            IntervalKind::ValueGap { column } => Some(column),
            IntervalKind::DatetimeGap => None,
        }
    }

    pub fn is_datetime_gap(&self) -> bool {
        matches!(self.kind, IntervalKind::DatetimeGap)
    }

    /// Row positions covered, for row-bounded intervals.
    pub fn row_range(&self) -> Option<Range<usize>> {
        match (self.start, self.end) {
            (IntervalBound::Row(start), IntervalBound::Row(end)) => Some(start..end),
            _ => None,
        }
    }

    /// Time span covered, for timestamp-bounded intervals.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.start, self.end) {
            (IntervalBound::Timestamp(start), IntervalBound::Timestamp(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn contains_time(&self, ts: NaiveDateTime) -> bool {
        self.time_range()
            .is_some_and(|(start, end)| start <= ts && ts < end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IntervalKind::DatetimeGap => write!(f, "datetime gap [{}, {})", self.start, self.end),
            IntervalKind::ValueGap { column } => {
                write!(f, "'{}' value gap [{}, {})", column, self.start, self.end)
            }
        }
    }
}
