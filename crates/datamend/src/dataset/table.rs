//! The typed in-memory table.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use tracing::debug;

use super::value::Value;
use crate::error::{DatamendError, Result};
use crate::inference::{compute_numeric_stats, infer_column_type, mode_period_ms};
use crate::input::DataTable;
use crate::schema::{ColumnSchema, ColumnType, TableSchema};

/// An uploaded table with typed cells, ordered by its timestamp column.
///
/// Rows are sorted ascending by timestamp with a stable sort: duplicate
/// timestamps keep their arrival order and rows without a timestamp follow
/// every timestamped row. `generation` starts at 0 and increments on every
/// successful treatment.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: TableSchema,
    rows: Vec<Vec<Value>>,
    generation: u64,
    epoch: u64,
    delimiter: u8,
}

impl Dataset {
    /// Build a dataset from a parsed table.
    ///
    /// `timestamp_column` names the ordering column explicitly; otherwise the
    /// first datetime column is used, if any.
    pub fn from_table(table: DataTable, timestamp_column: Option<&str>) -> Result<Self> {
        let mut columns = Vec::with_capacity(table.column_count());
        for (position, name) in table.headers.iter().enumerate() {
            let inferred = infer_column_type(table.column_values(position));
            let mut column = ColumnSchema::new(name.clone(), position, inferred.inferred_type);
            column.datetime_format = inferred.datetime_format;
            columns.push(column);
        }

        let mut schema = TableSchema::with_columns(columns);
        schema.timestamp_column = match timestamp_column {
            Some(name) => {
                let position = schema.position_of(name)?;
                if !schema.columns[position].inferred_type.is_temporal() {
                    return Err(DatamendError::Upload(format!(
                        "column '{}' does not contain timestamps",
                        name
                    )));
                }
                Some(position)
            }
            None => schema
                .columns
                .iter()
                .find(|c| c.inferred_type.is_temporal())
                .map(|c| c.position),
        };

        let rows = table
            .rows
            .iter()
            .map(|raw| {
                schema
                    .columns
                    .iter()
                    .map(|c| Value::from_raw(&raw[c.position], c.inferred_type, c.datetime_format))
                    .collect()
            })
            .collect();

        let mut dataset = Self {
            schema,
            rows,
            generation: 0,
            epoch: 0,
            delimiter: table.delimiter,
        };
        dataset.sort_by_timestamp();
        dataset.refresh_metadata();

        debug!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            timestamp_column = dataset.schema.timestamp().map(|c| c.name.as_str()),
            "built dataset"
        );

        Ok(dataset)
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }

    /// Mutation counter; detector output is only valid for the current value.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Upload sequence number assigned by the store.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Delimiter of the uploaded file.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of a named column, or `UnknownColumn`.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.position_of(name)
    }

    /// Iterate a column's cells in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Position of the timestamp column.
    pub fn timestamp_index(&self) -> Option<usize> {
        self.schema.timestamp_column
    }

    /// Timestamp of a row, if the dataset has a timestamp column and the cell is present.
    pub fn row_timestamp(&self, row: usize) -> Option<NaiveDateTime> {
        let index = self.timestamp_index()?;
        self.cell(row, index).and_then(Value::as_timestamp)
    }

    /// Present timestamps in row (ascending) order.
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        match self.timestamp_index() {
            Some(index) => self.column(index).filter_map(Value::as_timestamp).collect(),
            None => Vec::new(),
        }
    }

    /// Non-missing numeric values of a column in row order.
    pub fn numeric_values(&self, index: usize) -> Vec<f64> {
        self.column(index).filter_map(Value::as_f64).collect()
    }

    /// Resolve a column name, falling back to a unique case-insensitive match.
    pub fn resolve_column(&self, name: &str) -> Result<usize> {
        if let Ok(index) = self.column_index(name) {
            return Ok(index);
        }
        let mut matches = self
            .schema
            .columns
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case(name.trim()));
        match (matches.next(), matches.next()) {
            (Some(column), None) => Ok(column.position),
            _ => Err(DatamendError::UnknownColumn(name.to_string())),
        }
    }

    pub(crate) fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Value>> {
        &mut self.rows
    }

    /// Advance the generation after a successful mutation.
    pub(crate) fn bump_generation(&mut self) {
        self.generation += 1;
    }

    /// Stable sort by timestamp; rows without a timestamp go last.
    pub(crate) fn sort_by_timestamp(&mut self) {
        let Some(index) = self.timestamp_index() else {
            return;
        };
        self.rows.sort_by(|a, b| {
            match (a[index].as_timestamp(), b[index].as_timestamp()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    /// Recompute per-column missing counts, statistics and the sampling period.
    pub(crate) fn refresh_metadata(&mut self) {
        let timestamp_index = self.timestamp_index();
        let period = mode_period_ms(&self.timestamps());

        for position in 0..self.schema.columns.len() {
            let missing_count = self.column(position).filter(|v| v.is_missing()).count();
            let statistics = if self.schema.columns[position].inferred_type == ColumnType::Numeric {
                compute_numeric_stats(&self.numeric_values(position))
            } else {
                None
            };

            let column = &mut self.schema.columns[position];
            column.missing_count = missing_count;
            column.statistics = statistics;
            column.expected_period_ms = if timestamp_index == Some(position) {
                period
            } else {
                None
            };
        }
    }
}
