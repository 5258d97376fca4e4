//! Error types for the datamend library.

use std::path::PathBuf;

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Main error type for datamend operations.
#[derive(Debug, Error)]
pub enum DatamendError {
    /// The uploaded file could not be turned into a dataset.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// An operation needed a dataset but none has been uploaded.
    #[error("No active dataset; upload a file first")]
    NoActiveDataset,

    /// A column name that is not part of the dataset schema.
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    /// A value-gap interval was applied to a column it was not detected against.
    #[error("Interval '{interval}' was detected for column '{expected}', not selected column(s) {selected}")]
    IntervalColumnMismatch {
        interval: String,
        expected: String,
        selected: String,
    },

    /// Detector output or a selection refers to an older generation of the dataset.
    #[error("Stale {what}: not produced by the latest detection run at generation {current}; re-run detection")]
    StaleGeneration { what: String, current: u64 },

    /// An interval reference that cannot be interpreted.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// A treatment request that selects nothing to treat.
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    /// Treatment method is unknown or cannot be applied to a column.
    #[error("Unsupported treatment method '{method}': {reason}")]
    UnsupportedTreatmentMethod { method: String, reason: String },

    /// Filling the selected datetime gaps would insert more rows than allowed.
    #[error("Selection too large: filling it would insert {rows} row(s), limit is {limit}")]
    SelectionTooLarge { rows: usize, limit: usize },

    /// A numeric operation was requested on a non-numeric column.
    #[error("Column '{0}' is not numeric")]
    NonNumericColumn(String),

    /// The prompt did not match any known intent.
    #[error("Could not understand prompt: {0}")]
    PromptParse(String),

    /// Serializing the dataset failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DatamendError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upload(_) => "UPLOAD_ERROR",
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::NoActiveDataset => "NO_ACTIVE_DATASET",
            Self::UnknownColumn(_) => "UNKNOWN_COLUMN",
            Self::IntervalColumnMismatch { .. } => "INTERVAL_COLUMN_MISMATCH",
            Self::StaleGeneration { .. } => "STALE_GENERATION",
            Self::InvalidInterval(_) => "INVALID_INTERVAL",
            Self::EmptySelection(_) => "EMPTY_SELECTION",
            Self::UnsupportedTreatmentMethod { .. } => "UNSUPPORTED_TREATMENT_METHOD",
            Self::SelectionTooLarge { .. } => "SELECTION_TOO_LARGE",
            Self::NonNumericColumn(_) => "NON_NUMERIC_COLUMN",
            Self::PromptParse(_) => "PROMPT_PARSE_ERROR",
            Self::Export(_) => "EXPORT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the caller caused this error (as opposed to an internal fault).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Export(_) | Self::Io { .. } | Self::Json(_) | Self::Config(_)
        )
    }

    pub(crate) fn unsupported_method(method: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnsupportedTreatmentMethod {
            method: method.to_string(),
            reason: reason.into(),
        }
    }
}

impl Serialize for DatamendError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("DatamendError", 2)?;
        state.serialize_field("code", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for datamend operations.
pub type Result<T> = std::result::Result<T, DatamendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(DatamendError::NoActiveDataset.kind(), "NO_ACTIVE_DATASET");
        assert_eq!(
            DatamendError::UnknownColumn("x".into()).kind(),
            "UNKNOWN_COLUMN"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(DatamendError::NoActiveDataset.is_client_error());
        assert!(DatamendError::PromptParse("?".into()).is_client_error());
        assert!(DatamendError::SelectionTooLarge { rows: 2, limit: 1 }.is_client_error());
        assert!(!DatamendError::Export("disk full".into()).is_client_error());
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(DatamendError::UnknownColumn("temp".into())).unwrap();
        assert_eq!(json["code"], "UNKNOWN_COLUMN");
        assert_eq!(json["message"], "Unknown column 'temp'");
    }
}
