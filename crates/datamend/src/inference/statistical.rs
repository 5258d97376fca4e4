//! Column type inference and descriptive statistics.

use tracing::trace;

use super::temporal;
use crate::input::DataTable;
use crate::schema::{ColumnType, NumericStatistics, TimestampFormat};

/// Result of inferring a single column's type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInference {
    pub inferred_type: ColumnType,
    /// Set when the column is temporal.
    pub datetime_format: Option<TimestampFormat>,
}

/// Parse a cell as a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Infer a column's type from its raw cells.
///
/// A column is numeric (or temporal) only when every non-missing cell parses,
/// so converting cells never drops data. All-missing columns are `Unknown`.
pub fn infer_column_type<'a>(values: impl IntoIterator<Item = &'a str>) -> TypeInference {
    let present: Vec<&str> = values
        .into_iter()
        .filter(|v| !DataTable::is_null_value(v))
        .collect();

    let inference = if present.is_empty() {
        TypeInference {
            inferred_type: ColumnType::Unknown,
            datetime_format: None,
        }
    } else if present.iter().all(|v| parse_number(v).is_some()) {
        TypeInference {
            inferred_type: ColumnType::Numeric,
            datetime_format: None,
        }
    } else if let Some(format) = temporal::detect_format(&present) {
        TypeInference {
            inferred_type: ColumnType::DateTime,
            datetime_format: Some(format),
        }
    } else {
        TypeInference {
            inferred_type: ColumnType::Text,
            datetime_format: None,
        }
    };

    trace!(values = present.len(), inferred = %inference.inferred_type, "inferred column type");
    inference
}

/// Linear-interpolated quantile of an ascending slice (`p` in `[0, 1]`).
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = pos.floor() as usize;
            let upper = pos.ceil() as usize;
            let frac = pos - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Median of an unsorted slice, or `None` when empty.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile(&sorted, 0.5))
}

/// Arithmetic mean, or `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Compute exact descriptive statistics. Returns `None` for an empty slice.
pub fn compute_numeric_stats(values: &[f64]) -> Option<NumericStatistics> {
    let mean = mean(values)?;
    let count = values.len();

    let std = if count < 2 {
        0.0
    } else {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (count - 1) as f64).sqrt()
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    Some(NumericStatistics {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        mean,
        std,
        median: quantile(&sorted, 0.5),
        q1: quantile(&sorted, 0.25),
        q3: quantile(&sorted, 0.75),
    })
}
