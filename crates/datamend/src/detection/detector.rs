//! Datetime-gap and value-gap detection.

use chrono::Duration;
use serde::Serialize;
use tracing::debug;

use super::interval::{Interval, IntervalBound, IntervalKind};
use crate::dataset::Dataset;
use crate::error::{DatamendError, Result};
use crate::inference::mode_period_ms;

/// A gap must exceed the expected period by this factor to be reported.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.5;

/// Output of one detector invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionRun {
    /// Generation the run was computed against.
    pub generation: u64,
    /// Column scanned by a value-gap run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Expected sampling period of the timestamp column.
    pub expected_period_ms: Option<i64>,
    pub intervals: Vec<Interval>,
}

/// Computes gap intervals over a dataset snapshot.
///
/// Both detectors are pure functions of the dataset rows and the requested
/// generation. Column metadata is recomputed from the rows on every call
/// rather than read from the cached schema.
#[derive(Debug, Clone)]
pub struct IntervalDetector {
    gap_tolerance: f64,
}

impl IntervalDetector {
    pub fn new() -> Self {
        Self {
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
        }
    }

    pub fn with_tolerance(gap_tolerance: f64) -> Self {
        Self { gap_tolerance }
    }

    pub fn gap_tolerance(&self) -> f64 {
        self.gap_tolerance
    }

    /// Find spans of missing time ticks.
    ///
    /// For consecutive timestamps `t[i]`, `t[i+1]` whose difference exceeds
    /// `tolerance * p`, emits one interval `[t[i] + p, t[i+1])` no matter how
    /// many ticks are missing.
    pub fn detect_datetime_gaps(&self, dataset: &Dataset, generation: u64) -> Result<DetectionRun> {
        ensure_generation(dataset, generation)?;

        let timestamps = dataset.timestamps();
        let period = mode_period_ms(&timestamps);
        let mut intervals = Vec::new();

        if let Some(period) = period {
            let threshold = period as f64 * self.gap_tolerance;
            for pair in timestamps.windows(2) {
                let diff = (pair[1] - pair[0]).num_milliseconds();
                if (diff as f64) <= threshold {
                    continue;
                }
                intervals.push(Interval {
                    id: format!(
                        "dt-{}-{}-{}",
                        dataset.epoch(),
                        generation,
                        intervals.len()
                    ),
                    kind: IntervalKind::DatetimeGap,
                    start: IntervalBound::Timestamp(pair[0] + Duration::milliseconds(period)),
                    end: IntervalBound::Timestamp(pair[1]),
                    generation,
                    missing_count: ((diff - 1) / period) as usize,
                    period_ms: Some(period),
                    first_missing_at: None,
                    last_missing_at: None,
                });
            }
        }

        debug!(
            generation,
            period_ms = period,
            gaps = intervals.len(),
            "detected datetime gaps"
        );

        Ok(DetectionRun {
            generation,
            column: None,
            expected_period_ms: period,
            intervals,
        })
    }

    /// Find maximal runs of missing cells in one column.
    ///
    /// Each run becomes `[first_row, last_row + 1)`; when the dataset has a
    /// timestamp column the first and last missing timestamps are attached.
    pub fn detect_value_gaps(
        &self,
        dataset: &Dataset,
        column: &str,
        generation: u64,
    ) -> Result<DetectionRun> {
        let index = dataset.column_index(column)?;
        ensure_generation(dataset, generation)?;

        let mut intervals = Vec::new();
        let mut run_start: Option<usize> = None;
        let row_count = dataset.row_count();

        for (row, value) in dataset.column(index).enumerate() {
            match (value.is_missing(), run_start) {
                (true, None) => run_start = Some(row),
                (false, Some(start)) => {
                    intervals.push(value_gap(dataset, column, generation, intervals.len(), start, row));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            intervals.push(value_gap(dataset, column, generation, intervals.len(), start, row_count));
        }

        debug!(
            generation,
            column,
            gaps = intervals.len(),
            "detected value gaps"
        );

        Ok(DetectionRun {
            generation,
            column: Some(column.to_string()),
            expected_period_ms: mode_period_ms(&dataset.timestamps()),
            intervals,
        })
    }
}

impl Default for IntervalDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_generation(dataset: &Dataset, generation: u64) -> Result<()> {
    if dataset.generation() != generation {
        return Err(DatamendError::StaleGeneration {
            what: format!("detection request for generation {}", generation),
            current: dataset.generation(),
        });
    }
    Ok(())
}

fn value_gap(
    dataset: &Dataset,
    column: &str,
    generation: u64,
    ordinal: usize,
    start: usize,
    end: usize,
) -> Interval {
    Interval {
        id: format!("vg-{}-{}-{}-{}", dataset.epoch(), generation, column, ordinal),
        kind: IntervalKind::ValueGap {
            column: column.to_string(),
        },
        start: IntervalBound::Row(start),
        end: IntervalBound::Row(end),
        generation,
        missing_count: end - start,
        period_ms: None,
        first_missing_at: dataset.row_timestamp(start),
        last_missing_at: dataset.row_timestamp(end - 1),
    }
}
