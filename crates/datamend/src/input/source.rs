//! Uploaded source metadata and the raw parsed table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Client-supplied file name.
    pub file: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Delimiter the file was parsed with.
    pub delimiter: char,
    /// Detected encoding.
    pub encoding: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was accepted.
    pub uploaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    pub fn new(
        file: impl Into<String>,
        hash: String,
        size_bytes: u64,
        delimiter: u8,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        Self {
            file: file.into(),
            hash,
            size_bytes,
            format,
            delimiter: delimiter as char,
            encoding: "utf-8".to_string(),
            row_count,
            column_count,
            uploaded_at: Utc::now(),
        }
    }

    /// File stem used to name exports (`sensor.csv` -> `sensor`).
    pub fn stem(&self) -> &str {
        match self.file.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ if self.file.is_empty() => "dataset",
            _ => &self.file,
        }
    }
}

/// Parsed tabular data before type inference.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// The delimiter used.
    pub delimiter: u8,
}

impl DataTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, delimiter: u8) -> Self {
        Self {
            headers,
            rows,
            delimiter,
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null_value() {
        assert!(DataTable::is_null_value(""));
        assert!(DataTable::is_null_value("  "));
        assert!(DataTable::is_null_value("NA"));
        assert!(DataTable::is_null_value("N/A"));
        assert!(DataTable::is_null_value("NaN"));
        assert!(DataTable::is_null_value("null"));
        assert!(DataTable::is_null_value("."));
        assert!(!DataTable::is_null_value("value"));
        assert!(!DataTable::is_null_value("0"));
    }

    #[test]
    fn test_stem() {
        let meta = SourceMetadata::new("sensor.log.csv", String::new(), 0, b',', 0, 0);
        assert_eq!(meta.stem(), "sensor.log");
        let meta = SourceMetadata::new("", String::new(), 0, b',', 0, 0);
        assert_eq!(meta.stem(), "dataset");
        let meta = SourceMetadata::new("plain", String::new(), 0, b'\t', 0, 0);
        assert_eq!(meta.stem(), "plain");
        assert_eq!(meta.format, "tsv");
    }
}
