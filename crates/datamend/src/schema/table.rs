//! Table-level schema definition.

use serde::{Deserialize, Serialize};

use super::column::ColumnSchema;
use crate::error::{DatamendError, Result};

/// Schema for an entire table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableSchema {
    /// Schemas for each column, in file order.
    pub columns: Vec<ColumnSchema>,
    /// Position of the column that orders rows in time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_column: Option<usize>,
}

impl TableSchema {
    /// Create a table schema with the given columns.
    pub fn with_columns(columns: Vec<ColumnSchema>) -> Self {
        Self {
            columns,
            timestamp_column: None,
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column, or `UnknownColumn`.
    pub fn position_of(&self, name: &str) -> Result<usize> {
        self.get_column(name)
            .map(|c| c.position)
            .ok_or_else(|| DatamendError::UnknownColumn(name.to_string()))
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The timestamp column's schema, if the table has one.
    pub fn timestamp(&self) -> Option<&ColumnSchema> {
        self.timestamp_column.and_then(|i| self.columns.get(i))
    }
}
