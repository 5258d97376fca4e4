//! Serialization of the current dataset.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Dataset, Value};
use crate::error::{DatamendError, Result};
use crate::input::SourceMetadata;

/// Output format for downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    /// Format matching the uploaded file: tab-separated sources export as TSV.
    pub fn for_source(source: &SourceMetadata) -> Self {
        if source.delimiter == '\t' {
            ExportFormat::Tsv
        } else {
            ExportFormat::Csv
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Tsv => "text/tab-separated-values; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    fn delimiter(&self) -> Option<u8> {
        match self {
            ExportFormat::Csv => Some(b','),
            ExportFormat::Tsv => Some(b'\t'),
            ExportFormat::Json => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DatamendError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" | "tab" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(DatamendError::UnsupportedFormat(format!(
                "unknown export format '{}'. Use csv, tsv, or json.",
                s
            ))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A serialized dataset ready to be written or streamed.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Writes a dataset with its original column order and names.
///
/// Numbers use their shortest round-trip form, timestamps the format they
/// were parsed from, and missing cells are empty (`null` in JSON).
#[derive(Debug, Clone, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    pub fn export(
        &self,
        dataset: &Dataset,
        source: &SourceMetadata,
        format: ExportFormat,
    ) -> Result<ExportedFile> {
        let bytes = match format.delimiter() {
            Some(delimiter) => self.to_delimited(dataset, delimiter)?,
            None => self.to_json(dataset)?,
        };

        debug!(format = %format, bytes = bytes.len(), "exported dataset");

        Ok(ExportedFile {
            file_name: format!("{}_treated.{}", source.stem(), format.extension()),
            format,
            bytes,
        })
    }

    fn to_delimited(&self, dataset: &Dataset, delimiter: u8) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());

        writer.write_record(dataset.schema().column_names())?;
        for row in dataset.rows() {
            writer.write_record(
                row.iter()
                    .zip(&dataset.schema().columns)
                    .map(|(value, column)| value.render(column.datetime_format)),
            )?;
        }

        writer
            .into_inner()
            .map_err(|e| DatamendError::Export(e.to_string()))
    }

    fn to_json(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let columns = &dataset.schema().columns;
        let records: Vec<IndexMap<&str, serde_json::Value>> = dataset
            .rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| {
                        let json = match value {
                            Value::Number(n) => serde_json::Number::from_f64(*n)
                                .map_or(serde_json::Value::Null, serde_json::Value::Number),
                            Value::Missing => serde_json::Value::Null,
                            other => serde_json::Value::String(other.render(column.datetime_format)),
                        };
                        (column.name.as_str(), json)
                    })
                    .collect()
            })
            .collect();

        serde_json::to_vec_pretty(&records).map_err(|e| DatamendError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Parser;

    const SAMPLE: &str = "time,temp,site\n\
                          2024-01-01 00:00:00,10.5,north\n\
                          2024-01-01 00:05:00,NA,south\n\
                          2024-01-01 00:10:00,12,\n";

    fn load(name: &str, text: &str) -> (Dataset, SourceMetadata) {
        let (table, source) = Parser::new().parse_bytes(name, text.as_bytes()).unwrap();
        (Dataset::from_table(table, None).unwrap(), source)
    }

    #[test]
    fn test_csv_export() {
        let (ds, source) = load("sensor.csv", SAMPLE);
        let file = ExportService::new().export(&ds, &source, ExportFormat::Csv).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();

        assert_eq!(file.file_name, "sensor_treated.csv");
        assert_eq!(
            text,
            "time,temp,site\n\
             2024-01-01 00:00:00,10.5,north\n\
             2024-01-01 00:05:00,,south\n\
             2024-01-01 00:10:00,12,\n"
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let (ds, source) = load("sensor.csv", SAMPLE);
        let file = ExportService::new().export(&ds, &source, ExportFormat::Tsv).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        let (reloaded, _) = load("sensor.tsv", &text);

        assert_eq!(reloaded.column_names(), ds.column_names());
        assert_eq!(reloaded.rows(), ds.rows());
    }

    #[test]
    fn test_json_export_nulls() {
        let (ds, source) = load("sensor.csv", SAMPLE);
        let file = ExportService::new().export(&ds, &source, ExportFormat::Json).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_slice(&file.bytes).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["temp"], serde_json::json!(10.5));
        assert!(records[1]["temp"].is_null());
        assert_eq!(records[2]["time"], "2024-01-01 00:10:00");
        assert!(records[2]["site"].is_null());
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("TSV".parse::<ExportFormat>().unwrap(), ExportFormat::Tsv);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
