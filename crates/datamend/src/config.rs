//! Runtime configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::DEFAULT_GAP_TOLERANCE;
use crate::error::{DatamendError, Result};
use crate::export::ExportFormat;
use crate::input::ParserConfig;
use crate::treatment::DEFAULT_MAX_INSERTED_ROWS;

/// Settings for gap detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// A timestamp step larger than `gap_tolerance` periods is a gap.
    pub gap_tolerance: f64,
    /// Upper bound on rows a datetime-gap fill may insert.
    pub max_inserted_rows: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            gap_tolerance: DEFAULT_GAP_TOLERANCE,
            max_inserted_rows: DEFAULT_MAX_INSERTED_ROWS,
        }
    }
}

/// Thresholds for the outlier prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Flag values with `|z|` above this.
    pub zscore_threshold: f64,
    /// Flag values outside `[Q1 - k*IQR, Q3 + k*IQR]`.
    pub iqr_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 3.0,
            iqr_multiplier: 1.5,
        }
    }
}

/// Configuration for a datamend session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatamendConfig {
    pub parser: ParserConfig,
    pub detection: DetectionConfig,
    pub outliers: OutlierConfig,
    /// Ordering column; the first datetime column when unset.
    pub timestamp_column: Option<String>,
    /// Download format when none is requested; follows the upload when unset.
    pub export_format: Option<ExportFormat>,
}

impl DatamendConfig {
    /// Load configuration from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DatamendError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| DatamendError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.detection.gap_tolerance.is_finite() || self.detection.gap_tolerance < 1.0 {
            return Err(DatamendError::Config(format!(
                "detection.gap_tolerance must be at least 1.0, got {}",
                self.detection.gap_tolerance
            )));
        }
        if self.outliers.zscore_threshold.is_nan() || self.outliers.zscore_threshold <= 0.0 {
            return Err(DatamendError::Config(
                "outliers.zscore_threshold must be positive".to_string(),
            ));
        }
        if self.outliers.iqr_multiplier.is_nan() || self.outliers.iqr_multiplier <= 0.0 {
            return Err(DatamendError::Config(
                "outliers.iqr_multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
