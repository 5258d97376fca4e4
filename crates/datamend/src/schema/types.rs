//! Core type definitions for schema representation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Inferred data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Finite floating-point numbers.
    Numeric,
    /// Free text or categorical values.
    Text,
    /// Dates or date-times sharing one format.
    DateTime,
    /// Every value is missing.
    #[default]
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::DateTime)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Numeric => write!(f, "numeric"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::DateTime => write!(f, "datetime"),
            ColumnType::Unknown => write!(f, "unknown"),
        }
    }
}

/// A chrono format string a datetime column was parsed with.
///
/// Export writes timestamps back with the same format so a downloaded file
/// re-parses to the same values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampFormat {
    pattern: &'static str,
    date_only: bool,
}

impl TimestampFormat {
    pub(crate) const fn datetime(pattern: &'static str) -> Self {
        Self {
            pattern,
            date_only: false,
        }
    }

    pub(crate) const fn date(pattern: &'static str) -> Self {
        Self {
            pattern,
            date_only: true,
        }
    }

    /// The chrono strftime pattern.
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Whether values carry no time-of-day component.
    pub fn is_date_only(&self) -> bool {
        self.date_only
    }

    /// Parse a trimmed cell with this format.
    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        if self.date_only {
            NaiveDate::parse_from_str(value, self.pattern)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        } else {
            NaiveDateTime::parse_from_str(value, self.pattern).ok()
        }
    }

    /// Render a timestamp with this format.
    pub fn format(&self, ts: &NaiveDateTime) -> String {
        if self.date_only {
            ts.date().format(self.pattern).to_string()
        } else {
            ts.format(self.pattern).to_string()
        }
    }
}

impl Serialize for TimestampFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.pattern)
    }
}

impl<'de> Deserialize<'de> for TimestampFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        crate::inference::known_format(&pattern).ok_or_else(|| {
            serde::de::Error::custom(format!("unsupported timestamp format '{}'", pattern))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_only_round_trip() {
        let format = TimestampFormat::date("%Y-%m-%d");
        let ts = format.parse("2024-03-01").unwrap();
        assert_eq!(format.format(&ts), "2024-03-01");
    }

    #[test]
    fn test_serde_uses_pattern() {
        let format = TimestampFormat::datetime("%Y-%m-%d %H:%M:%S");
        let json = serde_json::to_string(&format).unwrap();
        assert_eq!(json, r#""%Y-%m-%d %H:%M:%S""#);
        let back: TimestampFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, format);
    }

    #[test]
    fn test_serde_rejects_unknown_pattern() {
        assert!(serde_json::from_str::<TimestampFormat>(r#""%Q""#).is_err());
    }
}
