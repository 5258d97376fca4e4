//! Column schema definition and statistics.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, TimestampFormat};

/// Descriptive statistics for numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    /// Number of non-missing values.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation (n - 1).
    pub std: f64,
    pub median: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
}

impl NumericStatistics {
    /// Calculate the interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Tukey fences `[Q1 - k*IQR, Q3 + k*IQR]`.
    pub fn iqr_bounds(&self, multiplier: f64) -> (f64, f64) {
        let iqr = self.iqr();
        (self.q1 - multiplier * iqr, self.q3 + multiplier * iqr)
    }

    /// Check if a value is an outlier using the IQR method.
    pub fn is_outlier_iqr(&self, value: f64, multiplier: f64) -> bool {
        let (lower, upper) = self.iqr_bounds(multiplier);
        value < lower || value > upper
    }

    /// Calculate the z-score for a value.
    pub fn z_score(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// Schema for a single column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Zero-based position in the table.
    pub position: usize,
    /// Inferred data type.
    pub inferred_type: ColumnType,
    /// Number of missing cells.
    pub missing_count: usize,
    /// Format the column's timestamps were parsed with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime_format: Option<TimestampFormat>,
    /// Mode of successive timestamp differences, in milliseconds.
    /// Only set on the dataset's timestamp column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_period_ms: Option<i64>,
    /// Statistics over non-missing values (numeric columns).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<NumericStatistics>,
}

impl ColumnSchema {
    /// Create a new column schema with basic information.
    pub fn new(name: impl Into<String>, position: usize, inferred_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            position,
            inferred_type,
            missing_count: 0,
            datetime_format: None,
            expected_period_ms: None,
            statistics: None,
        }
    }

    /// Get the missing percentage given the table's row count.
    pub fn missing_percentage(&self, row_count: usize) -> f64 {
        if row_count == 0 {
            0.0
        } else {
            (self.missing_count as f64 / row_count as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> NumericStatistics {
        NumericStatistics {
            count: 5,
            min: 1.0,
            max: 5.0,
            mean: 3.0,
            std: 1.5811,
            median: 3.0,
            q1: 2.0,
            q3: 4.0,
        }
    }

    #[test]
    fn test_iqr_bounds() {
        let s = stats();
        assert_eq!(s.iqr(), 2.0);
        assert_eq!(s.iqr_bounds(1.5), (-1.0, 7.0));
        assert!(s.is_outlier_iqr(7.5, 1.5));
        assert!(!s.is_outlier_iqr(7.0, 1.5));
    }

    #[test]
    fn test_z_score_zero_std() {
        let mut s = stats();
        s.std = 0.0;
        assert_eq!(s.z_score(100.0), 0.0);
    }

    #[test]
    fn test_missing_percentage() {
        let mut col = ColumnSchema::new("temp", 0, ColumnType::Numeric);
        col.missing_count = 3;
        assert_eq!(col.missing_percentage(6), 50.0);
        assert_eq!(col.missing_percentage(0), 0.0);
    }
}
