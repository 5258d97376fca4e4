//! Latest detector output per generation, and resolution of client references.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::detector::DetectionRun;
use super::interval::{Interval, IntervalBound};
use crate::error::{DatamendError, Result};
use crate::inference::parse_any;

/// A bound as sent by a client: a row index or a timestamp string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoundRef {
    Row(usize),
    Text(String),
}

impl BoundRef {
    fn to_bound(&self) -> Result<IntervalBound> {
        match self {
            BoundRef::Row(row) => Ok(IntervalBound::Row(*row)),
            BoundRef::Text(text) => {
                if let Some(ts) = parse_any(text) {
                    Ok(IntervalBound::Timestamp(ts))
                } else if let Ok(row) = text.trim().parse::<usize>() {
                    Ok(IntervalBound::Row(row))
                } else {
                    Err(DatamendError::InvalidInterval(format!(
                        "bound '{}' is neither a row index nor a timestamp",
                        text
                    )))
                }
            }
        }
    }
}

impl fmt::Display for BoundRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundRef::Row(row) => write!(f, "{}", row),
            BoundRef::Text(text) => write!(f, "{}", text),
        }
    }
}

/// How a client names an interval in a treatment request.
///
/// Either the detector-issued id, or the `{start, end}` pair (optionally with
/// the value-gap column). An echoed interval object carrying its `id` is
/// resolved by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalRef {
    Id(String),
    Bounds {
        #[serde(default)]
        id: Option<String>,
        start: BoundRef,
        end: BoundRef,
        #[serde(default)]
        column: Option<String>,
    },
}

impl fmt::Display for IntervalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalRef::Id(id) | IntervalRef::Bounds { id: Some(id), .. } => {
                write!(f, "interval '{}'", id)
            }
            IntervalRef::Bounds {
                start, end, column, ..
            } => match column {
                Some(column) => write!(f, "interval [{}, {}) of '{}'", start, end, column),
                None => write!(f, "interval [{}, {})", start, end),
            },
        }
    }
}

/// Intervals from the most recent detector runs at one generation.
///
/// Re-running a detector replaces that detector's previous output. Recording
/// a run from a newer generation discards everything older.
#[derive(Debug, Clone, Default)]
pub struct IntervalRegistry {
    generation: u64,
    datetime: Vec<Interval>,
    value: IndexMap<String, Vec<Interval>>,
}

impl IntervalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a detector run, replacing earlier output of the same detector.
    pub fn record(&mut self, run: &DetectionRun) {
        if run.generation != self.generation {
            self.clear();
            self.generation = run.generation;
        }
        match &run.column {
            Some(column) => {
                self.value.insert(column.clone(), run.intervals.clone());
            }
            None => self.datetime = run.intervals.clone(),
        }
    }

    /// Drop every recorded interval.
    pub fn clear(&mut self) {
        self.datetime.clear();
        self.value.clear();
    }

    /// All recorded intervals, datetime gaps first.
    pub fn intervals(&self) -> impl Iterator<Item = &Interval> {
        self.datetime.iter().chain(self.value.values().flatten())
    }

    pub fn get(&self, id: &str) -> Option<&Interval> {
        self.intervals().find(|i| i.id == id)
    }

    /// Resolve a client reference against the latest detector output.
    ///
    /// Anything not produced by a run at `current_generation` is rejected
    /// with `StaleGeneration`.
    pub fn resolve(&self, reference: &IntervalRef, current_generation: u64) -> Result<Interval> {
        let stale = || DatamendError::StaleGeneration {
            what: reference.to_string(),
            current: current_generation,
        };

        if self.generation != current_generation {
            return Err(stale());
        }

        match reference {
            IntervalRef::Id(id) | IntervalRef::Bounds { id: Some(id), .. } => {
                self.get(id).cloned().ok_or_else(stale)
            }
            IntervalRef::Bounds {
                start, end, column, ..
            } => {
                let start = start.to_bound()?;
                let end = end.to_bound()?;

                let candidates: Vec<&Interval> = self
                    .intervals()
                    .filter(|i| i.start == start && i.end == end)
                    .filter(|i| match column {
                        Some(column) => i.column() == Some(column.as_str()),
                        None => true,
                    })
                    .collect();

                match candidates.as_slice() {
                    [] => Err(stale()),
                    [only] => Ok((*only).clone()),
                    several => several
                        .iter()
                        .find(|i| i.is_datetime_gap())
                        .map(|i| (*i).clone())
                        .ok_or_else(|| {
                            DatamendError::InvalidInterval(format!(
                                "{} matches value gaps in several columns; include 'column'",
                                reference
                            ))
                        }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::IntervalKind;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn run(generation: u64, column: Option<&str>, intervals: Vec<Interval>) -> DetectionRun {
        DetectionRun {
            generation,
            column: column.map(String::from),
            expected_period_ms: Some(300_000),
            intervals,
        }
    }

    fn value_gap(id: &str, column: &str, start: usize, end: usize, generation: u64) -> Interval {
        Interval {
            id: id.to_string(),
            kind: IntervalKind::ValueGap {
                column: column.to_string(),
            },
            start: IntervalBound::Row(start),
            end: IntervalBound::Row(end),
            generation,
            missing_count: end - start,
            period_ms: None,
            first_missing_at: None,
            last_missing_at: None,
        }
    }

    fn datetime_gap(id: &str, start: &str, end: &str) -> Interval {
        Interval {
            id: id.to_string(),
            kind: IntervalKind::DatetimeGap,
            start: IntervalBound::Timestamp(ts(start)),
            end: IntervalBound::Timestamp(ts(end)),
            generation: 0,
            missing_count: 1,
            period_ms: Some(300_000),
            first_missing_at: None,
            last_missing_at: None,
        }
    }

    #[test]
    fn test_resolve_by_id() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(0, Some("temp"), vec![value_gap("a", "temp", 1, 3, 0)]));

        let resolved = registry.resolve(&IntervalRef::Id("a".into()), 0).unwrap();
        assert_eq!(resolved.row_range(), Some(1..3));
        assert!(matches!(
            registry.resolve(&IntervalRef::Id("missing".into()), 0),
            Err(DatamendError::StaleGeneration { .. })
        ));
    }

    #[test]
    fn test_resolve_timestamp_bounds_from_json() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(
            0,
            None,
            vec![datetime_gap("dt", "2024-01-01 00:10:00", "2024-01-01 00:15:00")],
        ));

        let reference: IntervalRef = serde_json::from_str(
            r#"{"start": "2024-01-01T00:10:00", "end": "2024-01-01 00:15:00"}"#,
        )
        .unwrap();
        assert_eq!(registry.resolve(&reference, 0).unwrap().id, "dt");
    }

    #[test]
    fn test_resolve_row_bounds_needs_column_when_ambiguous() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(0, Some("a"), vec![value_gap("a0", "a", 1, 3, 0)]));
        registry.record(&run(0, Some("b"), vec![value_gap("b0", "b", 1, 3, 0)]));

        let ambiguous: IntervalRef = serde_json::from_str(r#"{"start": 1, "end": 3}"#).unwrap();
        assert!(matches!(
            registry.resolve(&ambiguous, 0),
            Err(DatamendError::InvalidInterval(_))
        ));

        let exact: IntervalRef =
            serde_json::from_str(r#"{"start": 1, "end": 3, "column": "b"}"#).unwrap();
        assert_eq!(registry.resolve(&exact, 0).unwrap().id, "b0");
    }

    #[test]
    fn test_newer_generation_discards_older_runs() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(0, Some("temp"), vec![value_gap("old", "temp", 1, 3, 0)]));
        registry.record(&run(1, Some("other"), vec![]));

        assert!(registry.get("old").is_none());
        assert!(matches!(
            registry.resolve(&IntervalRef::Id("old".into()), 1),
            Err(DatamendError::StaleGeneration { .. })
        ));
    }

    #[test]
    fn test_registry_behind_dataset_is_stale() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(0, Some("temp"), vec![value_gap("a", "temp", 1, 3, 0)]));
        assert!(matches!(
            registry.resolve(&IntervalRef::Id("a".into()), 1),
            Err(DatamendError::StaleGeneration { current: 1, .. })
        ));
    }

    #[test]
    fn test_echoed_interval_resolves_by_id() {
        let mut registry = IntervalRegistry::new();
        registry.record(&run(0, Some("temp"), vec![value_gap("vg-1-0-temp-0", "temp", 1, 3, 0)]));
        let echoed = serde_json::to_string(&value_gap("vg-1-0-temp-0", "temp", 1, 3, 0)).unwrap();
        let reference: IntervalRef = serde_json::from_str(&echoed).unwrap();
        assert_eq!(registry.resolve(&reference, 0).unwrap().id, "vg-1-0-temp-0");
    }

    #[test]
    fn test_invalid_bound() {
        let registry = IntervalRegistry::new();
        let reference: IntervalRef =
            serde_json::from_str(r#"{"start": "soon", "end": "later"}"#).unwrap();
        assert!(matches!(
            registry.resolve(&reference, 0),
            Err(DatamendError::InvalidInterval(_))
        ));
    }
}
