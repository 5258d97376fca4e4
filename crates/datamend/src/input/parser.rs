//! Delimited-text parser with delimiter detection and format sniffing.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{DataTable, SourceMetadata};
use crate::error::{DatamendError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Zip local-file header; xlsx/ods workbooks are zip archives.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE2 compound document header used by legacy .xls files.
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    #[serde(with = "delimiter_char")]
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    #[serde(skip)]
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses uploaded tabular files.
#[derive(Debug, Clone)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file from disk.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| DatamendError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| DatamendError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.parse_bytes(&name, &contents)
    }

    /// Parse an in-memory upload. `name` is the client-supplied file name.
    pub fn parse_bytes(&self, name: &str, bytes: &[u8]) -> Result<(DataTable, SourceMetadata)> {
        if bytes.is_empty() {
            return Err(DatamendError::Upload("file is empty".to_string()));
        }

        reject_binary_formats(name, bytes)?;

        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if std::str::from_utf8(body).is_err() {
            return Err(DatamendError::Upload(
                "file is not valid UTF-8 text".to_string(),
            ));
        }

        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(body)?,
        };

        let table = self.parse_table(body, delimiter)?;

        debug!(
            file = name,
            delimiter = %(delimiter as char).escape_default(),
            rows = table.row_count(),
            columns = table.column_count(),
            "parsed upload"
        );

        let metadata = SourceMetadata::new(
            name,
            hash,
            bytes.len() as u64,
            delimiter,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    fn reader<'a>(&self, bytes: &'a [u8], delimiter: u8) -> csv::Reader<&'a [u8]> {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes)
    }

    fn parse_table(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = self.reader(bytes, delimiter);

        let headers: Vec<String> = if self.config.has_header {
            reader
                .headers()
                .map_err(upload_error)?
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let h = h.trim();
                    if h.is_empty() {
                        format!("column_{}", i + 1)
                    } else {
                        h.to_string()
                    }
                })
                .collect()
        } else {
            match reader.records().next() {
                Some(Ok(record)) => (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect(),
                Some(Err(e)) => return Err(upload_error(e)),
                None => return Err(DatamendError::Upload("no data rows found".to_string())),
            }
        };

        if headers.is_empty() {
            return Err(DatamendError::Upload("no columns found".to_string()));
        }

        for (i, name) in headers.iter().enumerate() {
            if headers[..i].contains(name) {
                return Err(DatamendError::Upload(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();

        // Re-create the reader so the no-header case starts from the first record.
        let mut reader = self.reader(bytes, delimiter);

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result.map_err(upload_error)?;

            // A row of empty fields is a row of missing values; only skip
            // records with no fields at all.
            if record.is_empty() {
                continue;
            }

            if record.iter().skip(expected_cols).any(|f| !f.trim().is_empty()) {
                return Err(DatamendError::Upload(format!(
                    "malformed row {}: expected {} fields, found {}",
                    row_idx + 1,
                    expected_cols,
                    record.len()
                )));
            }

            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            row.resize(expected_cols, String::new());
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(DatamendError::Upload("no data rows found".to_string()));
        }

        Ok(DataTable::new(headers, rows, delimiter))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

fn upload_error(e: csv::Error) -> DatamendError {
    DatamendError::Upload(format!("malformed input: {}", e))
}

/// Reject spreadsheet workbooks and other binary payloads before decoding.
fn reject_binary_formats(name: &str, bytes: &[u8]) -> Result<()> {
    let lower = name.to_ascii_lowercase();

    if bytes.starts_with(ZIP_MAGIC) || lower.ends_with(".xlsx") || lower.ends_with(".ods") {
        return Err(DatamendError::UnsupportedFormat(
            "spreadsheet workbooks (xlsx/ods) are not supported; save the sheet as CSV".to_string(),
        ));
    }

    if bytes.starts_with(OLE2_MAGIC) || lower.ends_with(".xls") {
        return Err(DatamendError::UnsupportedFormat(
            "legacy Excel (.xls) files are not supported; save the sheet as CSV".to_string(),
        ));
    }

    if lower.ends_with(".parquet") || bytes.starts_with(b"PAR1") {
        return Err(DatamendError::UnsupportedFormat(
            "parquet files are not supported".to_string(),
        ));
    }

    Ok(())
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(DatamendError::Upload("no lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Consistent counts win; tabs get a small bonus since they rarely occur inside values.
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

/// Serializes an optional delimiter byte as a one-character string.
mod delimiter_char {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(b) => serializer.serialize_some(&(*b as char).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None => Ok(None),
            Some("\\t") | Some("tab") => Ok(Some(b'\t')),
            Some(s) if s.len() == 1 && s.is_ascii() => Ok(Some(s.as_bytes()[0])),
            Some(other) => Err(D::Error::custom(format!(
                "delimiter must be a single ASCII character, got '{}'",
                other
            ))),
        }
    }
}
