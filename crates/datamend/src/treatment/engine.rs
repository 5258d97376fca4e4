//! Applies treatment selections to a dataset.

use std::ops::Range;

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use super::method::TreatmentMethod;
use super::selection::Selection;
use crate::dataset::{Dataset, Value};
use crate::error::{DatamendError, Result};
use crate::inference::{mean, median};

/// Default upper bound on rows a single datetime-gap fill may insert.
pub const DEFAULT_MAX_INSERTED_ROWS: usize = 100_000;

/// Outcome of a successful `apply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatmentReport {
    pub method: TreatmentMethod,
    pub columns: Vec<String>,
    /// Number of intervals in the selection.
    pub intervals: usize,
    /// Cells that received a value.
    pub applied_count: usize,
    /// Target cells left missing because no source value existed.
    pub unresolved_count: usize,
    /// Rows materialized for missing time ticks.
    pub rows_inserted: usize,
    pub rows_deleted: usize,
    /// Dataset generation after the apply.
    pub generation: u64,
}

impl TreatmentReport {
    /// Human-readable summary.
    pub fn message(&self) -> String {
        if self.method == TreatmentMethod::DeleteRows {
            return format!(
                "Deleted {} row(s) across {} interval(s); dataset is now at generation {}.",
                self.rows_deleted, self.intervals, self.generation
            );
        }

        let mut message = format!(
            "Applied {} to {} over {} interval(s): {} cell(s) filled",
            self.method,
            self.columns.join(", "),
            self.intervals,
            self.applied_count
        );
        if self.unresolved_count > 0 {
            message.push_str(&format!(
                ", {} left unresolved (no source value)",
                self.unresolved_count
            ));
        }
        if self.rows_inserted > 0 {
            message.push_str(&format!(
                ", {} row(s) inserted for missing time ticks",
                self.rows_inserted
            ));
        }
        message.push_str(&format!("; dataset is now at generation {}.", self.generation));
        message
    }
}

/// Validated, position-based form of a selection.
#[derive(Debug, Default)]
struct Plan {
    /// Columns filled in rows materialized for datetime gaps.
    datetime_columns: Vec<usize>,
    /// `(start, end, period_ms)` of each datetime gap.
    datetime_gaps: Vec<(NaiveDateTime, NaiveDateTime, i64)>,
    /// Column position and row range of each value gap.
    value_gaps: Vec<(usize, Range<usize>)>,
}

/// Mutates a dataset according to a [`Selection`].
///
/// `apply` is atomic: the selection is validated in full, the treatment runs
/// on a working copy, and the dataset is replaced only on success. Fill
/// methods only ever write missing cells.
#[derive(Debug, Clone)]
pub struct TreatmentEngine {
    max_inserted_rows: usize,
}

impl Default for TreatmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TreatmentEngine {
    pub fn new() -> Self {
        Self::with_max_inserted_rows(DEFAULT_MAX_INSERTED_ROWS)
    }

    /// Reject fills that would materialize more than `limit` tick rows.
    pub fn with_max_inserted_rows(limit: usize) -> Self {
        Self {
            max_inserted_rows: limit,
        }
    }

    pub fn apply(&self, dataset: &mut Dataset, selection: &Selection) -> Result<TreatmentReport> {
        let plan = validate(dataset, selection)?;

        if selection.method.is_fill() {
            let rows = plan.tick_count();
            if rows > self.max_inserted_rows {
                return Err(DatamendError::SelectionTooLarge {
                    rows,
                    limit: self.max_inserted_rows,
                });
            }
        }

        let mut working = dataset.clone();
        let mut report = TreatmentReport {
            method: selection.method,
            columns: selection.columns.iter().cloned().collect(),
            intervals: selection.intervals.len(),
            applied_count: 0,
            unresolved_count: 0,
            rows_inserted: 0,
            rows_deleted: 0,
            generation: dataset.generation(),
        };

        match selection.method {
            TreatmentMethod::DeleteRows => {
                report.rows_deleted = delete_rows(&mut working, &plan);
            }
            method => fill(&mut working, &plan, method, &mut report),
        }

        working.bump_generation();
        working.refresh_metadata();
        report.generation = working.generation();
        *dataset = working;

        info!(
            method = %report.method,
            applied = report.applied_count,
            unresolved = report.unresolved_count,
            inserted = report.rows_inserted,
            deleted = report.rows_deleted,
            generation = report.generation,
            "applied treatment"
        );

        Ok(report)
    }
}

impl Plan {
    /// Upper bound on the tick rows a fill would insert.
    fn tick_count(&self) -> usize {
        self.datetime_gaps
            .iter()
            .map(|&(start, end, period)| {
                let span = (end - start).num_milliseconds().max(0);
                let ticks = span / period + i64::from(span % period != 0);
                usize::try_from(ticks).unwrap_or(usize::MAX)
            })
            .fold(0usize, usize::saturating_add)
    }
}

/// Check every (column, interval) pair before anything is mutated.
fn validate(dataset: &Dataset, selection: &Selection) -> Result<Plan> {
    let method = selection.method;

    if selection.intervals.is_empty() {
        return Err(DatamendError::EmptySelection("no intervals selected".to_string()));
    }
    if method.is_fill() && selection.columns.is_empty() {
        return Err(DatamendError::EmptySelection(format!(
            "{} needs at least one column",
            method
        )));
    }

    let mut selected = Vec::with_capacity(selection.columns.len());
    for name in &selection.columns {
        selected.push(dataset.column_index(name)?);
    }

    let timestamp_index = dataset.timestamp_index();
    let mut plan = Plan {
        datetime_columns: selected
            .iter()
            .copied()
            .filter(|&c| Some(c) != timestamp_index)
            .collect(),
        ..Plan::default()
    };

    for interval in &selection.intervals {
        if interval.generation != dataset.generation() {
            return Err(DatamendError::StaleGeneration {
                what: format!("{} ('{}')", interval, interval.id),
                current: dataset.generation(),
            });
        }

        match interval.column() {
            Some(column) => {
                let index = dataset.column_index(column)?;
                let enforce_columns = method.is_fill() || !selection.columns.is_empty();
                if enforce_columns && !selection.columns.contains(column) {
                    return Err(DatamendError::IntervalColumnMismatch {
                        interval: interval.id.clone(),
                        expected: column.to_string(),
                        selected: format!("{:?}", selection.columns.iter().collect::<Vec<_>>()),
                    });
                }
                if method.is_fill() && Some(index) == timestamp_index {
                    return Err(DatamendError::unsupported_method(
                        method,
                        format!("'{}' orders the dataset and cannot be imputed", column),
                    ));
                }
                let range = interval.row_range().ok_or_else(|| {
                    DatamendError::InvalidInterval(format!("{} is not row-bounded", interval))
                })?;
                if range.start >= range.end || range.end > dataset.row_count() {
                    return Err(DatamendError::StaleGeneration {
                        what: format!("{} ('{}')", interval, interval.id),
                        current: dataset.generation(),
                    });
                }
                plan.value_gaps.push((index, range));
            }
            None => {
                let (start, end) = interval.time_range().ok_or_else(|| {
                    DatamendError::InvalidInterval(format!("{} is not time-bounded", interval))
                })?;
                let period = interval.period_ms.filter(|p| *p > 0).ok_or_else(|| {
                    DatamendError::InvalidInterval(format!("{} has no sampling period", interval))
                })?;
                if timestamp_index.is_none() {
                    return Err(DatamendError::InvalidInterval(format!(
                        "{} requires a timestamp column",
                        interval
                    )));
                }
                plan.datetime_gaps.push((start, end, period));
            }
        }
    }

    if method.is_statistical() {
        let mut treated: Vec<usize> = plan.value_gaps.iter().map(|(c, _)| *c).collect();
        if !plan.datetime_gaps.is_empty() {
            treated.extend(plan.datetime_columns.iter().copied());
        }
        for index in treated {
            let column = &dataset.schema().columns[index];
            if !column.inferred_type.is_numeric() {
                return Err(DatamendError::unsupported_method(
                    method,
                    format!(
                        "column '{}' is {}; {} needs a numeric column",
                        column.name, column.inferred_type, method
                    ),
                ));
            }
        }
    }

    debug!(
        method = %method,
        datetime_gaps = plan.datetime_gaps.len(),
        value_gaps = plan.value_gaps.len(),
        "validated selection"
    );

    Ok(plan)
}

/// Missing ticks `start, start + p, ...` strictly before `end`, over all gaps.
fn missing_ticks(plan: &Plan) -> Vec<NaiveDateTime> {
    let mut ticks = Vec::new();
    for &(start, end, period) in &plan.datetime_gaps {
        let step = Duration::milliseconds(period);
        let mut tick = start;
        while tick < end {
            ticks.push(tick);
            tick += step;
        }
    }
    ticks.sort();
    ticks.dedup();
    ticks
}

fn fill(working: &mut Dataset, plan: &Plan, method: TreatmentMethod, report: &mut TreatmentReport) {
    let column_count = working.column_count();
    let timestamp_index = working.timestamp_index();
    let ticks = missing_ticks(plan);

    // Merge materialized tick rows into the (sorted) original rows.
    let original = std::mem::take(working.rows_mut());
    let mut rows: Vec<Vec<Value>> = Vec::with_capacity(original.len() + ticks.len());
    let mut inserted: Vec<usize> = Vec::with_capacity(ticks.len());
    let mut new_position: Vec<usize> = Vec::with_capacity(original.len());
    let mut next_tick = 0;

    let mut push_ticks_before = |limit: Option<NaiveDateTime>, rows: &mut Vec<Vec<Value>>| {
        while next_tick < ticks.len() && limit.is_none_or(|t| ticks[next_tick] < t) {
            let mut row = vec![Value::Missing; column_count];
            if let Some(index) = timestamp_index {
                row[index] = Value::Timestamp(ticks[next_tick]);
            }
            inserted.push(rows.len());
            rows.push(row);
            next_tick += 1;
        }
    };

    for row in original {
        let ts = timestamp_index.and_then(|i| row[i].as_timestamp());
        push_ticks_before(ts, &mut rows);
        new_position.push(rows.len());
        rows.push(row);
    }
    push_ticks_before(None, &mut rows);
    report.rows_inserted = inserted.len();

    // Target mask per treated column, over the merged rows.
    let mut targets: IndexMap<usize, Vec<bool>> = IndexMap::new();
    if !inserted.is_empty() {
        for &column in &plan.datetime_columns {
            let mask = targets
                .entry(column)
                .or_insert_with(|| vec![false; rows.len()]);
            for &row in &inserted {
                mask[row] = true;
            }
        }
    }
    for (column, range) in &plan.value_gaps {
        let mask = targets
            .entry(*column)
            .or_insert_with(|| vec![false; rows.len()]);
        for old in range.clone() {
            mask[new_position[old]] = true;
        }
    }

    for (&column, mask) in &targets {
        let (applied, unresolved) = match method {
            TreatmentMethod::ForwardFill => carry_fill(&mut rows, column, mask, false),
            TreatmentMethod::BackwardFill => carry_fill(&mut rows, column, mask, true),
            TreatmentMethod::Mean | TreatmentMethod::Median => {
                // Statistic over values outside the selected intervals, computed once.
                let source: Vec<f64> = rows
                    .iter()
                    .zip(mask)
                    .filter(|(_, target)| !**target)
                    .filter_map(|(row, _)| row[column].as_f64())
                    .collect();
                let statistic = if method == TreatmentMethod::Mean {
                    mean(&source)
                } else {
                    median(&source)
                };
                constant_fill(&mut rows, column, mask, statistic.map(Value::Number))
            }
            TreatmentMethod::DeleteRows => (0, 0),
        };
        report.applied_count += applied;
        report.unresolved_count += unresolved;
    }

    *working.rows_mut() = rows;
}

/// Fill targeted missing cells from the nearest non-missing neighbour.
/// Returns `(applied, unresolved)`.
fn carry_fill(rows: &mut [Vec<Value>], column: usize, mask: &[bool], backward: bool) -> (usize, usize) {
    let mut applied = 0;
    let mut unresolved = 0;
    let mut carried: Option<Value> = None;

    let order: Box<dyn Iterator<Item = usize>> = if backward {
        Box::new((0..rows.len()).rev())
    } else {
        Box::new(0..rows.len())
    };

    for row in order {
        let cell = &mut rows[row][column];
        if !cell.is_missing() {
            carried = Some(cell.clone());
        } else if mask[row] {
            match &carried {
                Some(value) => {
                    *cell = value.clone();
                    applied += 1;
                }
                None => unresolved += 1,
            }
        }
    }

    (applied, unresolved)
}

fn constant_fill(
    rows: &mut [Vec<Value>],
    column: usize,
    mask: &[bool],
    value: Option<Value>,
) -> (usize, usize) {
    let mut applied = 0;
    let mut unresolved = 0;
    for (row, &target) in rows.iter_mut().zip(mask) {
        if !target || !row[column].is_missing() {
            continue;
        }
        match &value {
            Some(v) => {
                row[column] = v.clone();
                applied += 1;
            }
            None => unresolved += 1,
        }
    }
    (applied, unresolved)
}

/// Remove whole rows. Value gaps delete rows of their range whose cell is
/// still missing; datetime gaps delete rows timestamped inside the gap.
fn delete_rows(working: &mut Dataset, plan: &Plan) -> usize {
    let timestamp_index = working.timestamp_index();
    let rows = std::mem::take(working.rows_mut());
    let before = rows.len();

    let kept: Vec<Vec<Value>> = rows
        .into_iter()
        .enumerate()
        .filter(|(position, row)| {
            let in_value_gap = plan
                .value_gaps
                .iter()
                .any(|(column, range)| range.contains(position) && row[*column].is_missing());
            let in_datetime_gap = timestamp_index
                .and_then(|i| row[i].as_timestamp())
                .is_some_and(|ts| {
                    plan.datetime_gaps
                        .iter()
                        .any(|(start, end, _)| *start <= ts && ts < *end)
                });
            !(in_value_gap || in_datetime_gap)
        })
        .map(|(_, row)| row)
        .collect();

    let deleted = before - kept.len();
    *working.rows_mut() = kept;
    deleted
}
