//! Typed cell values.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::input::DataTable;
use crate::inference::parse_number;
use crate::schema::{ColumnType, TimestampFormat};

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Missing,
}

impl Value {
    /// Convert a raw cell according to its column's inferred type.
    pub fn from_raw(raw: &str, column_type: ColumnType, format: Option<TimestampFormat>) -> Self {
        if DataTable::is_null_value(raw) {
            return Value::Missing;
        }
        match column_type {
            ColumnType::Numeric => parse_number(raw).map_or(Value::Missing, Value::Number),
            ColumnType::DateTime => format
                .and_then(|f| f.parse(raw))
                .map_or(Value::Missing, Value::Timestamp),
            ColumnType::Text => Value::Text(raw.to_string()),
            ColumnType::Unknown => Value::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Render for delimited output; missing cells become empty strings.
    pub fn render(&self, format: Option<TimestampFormat>) -> String {
        match self {
            Value::Number(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Timestamp(t) => match format {
                Some(f) => f.format(t),
                None => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
            Value::Missing => String::new(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(v) => serializer.serialize_f64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Timestamp(t) => t.serialize(serializer),
            Value::Missing => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_numeric() {
        assert_eq!(Value::from_raw(" 12.5", ColumnType::Numeric, None), Value::Number(12.5));
        assert_eq!(Value::from_raw("NaN", ColumnType::Numeric, None), Value::Missing);
        assert_eq!(Value::from_raw("", ColumnType::Text, None), Value::Missing);
    }

    #[test]
    fn test_render_numbers_shortest() {
        assert_eq!(Value::Number(12.0).render(None), "12");
        assert_eq!(Value::Number(0.1).render(None), "0.1");
        assert_eq!(Value::Missing.render(None), "");
    }

    #[test]
    fn test_serialize_missing_as_null() {
        let json = serde_json::to_string(&vec![Value::Number(1.5), Value::Missing]).unwrap();
        assert_eq!(json, "[1.5,null]");
    }
}
