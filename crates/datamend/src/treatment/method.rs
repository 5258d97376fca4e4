//! Treatment methods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DatamendError;

/// How a selected region is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentMethod {
    /// Carry the nearest preceding value forward.
    ForwardFill,
    /// Carry the nearest following value backward.
    BackwardFill,
    /// Fill with the column mean outside the selected intervals.
    Mean,
    /// Fill with the column median outside the selected intervals.
    Median,
    /// Remove whole rows.
    DeleteRows,
}

impl TreatmentMethod {
    /// Methods that fill cells rather than removing rows.
    pub fn is_fill(&self) -> bool {
        !matches!(self, TreatmentMethod::DeleteRows)
    }

    /// Methods that need a numeric column.
    pub fn is_statistical(&self) -> bool {
        matches!(self, TreatmentMethod::Mean | TreatmentMethod::Median)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentMethod::ForwardFill => "forward_fill",
            TreatmentMethod::BackwardFill => "backward_fill",
            TreatmentMethod::Mean => "mean",
            TreatmentMethod::Median => "median",
            TreatmentMethod::DeleteRows => "delete_rows",
        }
    }
}

impl FromStr for TreatmentMethod {
    type Err = DatamendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "forward_fill" | "ffill" | "pad" => Ok(TreatmentMethod::ForwardFill),
            "backward_fill" | "bfill" | "backfill" => Ok(TreatmentMethod::BackwardFill),
            "mean" => Ok(TreatmentMethod::Mean),
            "median" => Ok(TreatmentMethod::Median),
            "delete_rows" | "delete" | "drop" => Ok(TreatmentMethod::DeleteRows),
            _ => Err(DatamendError::unsupported_method(
                s,
                "use forward_fill, backward_fill, mean, median or delete_rows",
            )),
        }
    }
}

impl fmt::Display for TreatmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!("ffill".parse::<TreatmentMethod>().unwrap(), TreatmentMethod::ForwardFill);
        assert_eq!("Backward Fill".parse::<TreatmentMethod>().unwrap(), TreatmentMethod::BackwardFill);
        assert_eq!("delete".parse::<TreatmentMethod>().unwrap(), TreatmentMethod::DeleteRows);
        assert_eq!(" MEDIAN ".parse::<TreatmentMethod>().unwrap(), TreatmentMethod::Median);
    }

    #[test]
    fn test_unknown_method() {
        let err = "interpolate".parse::<TreatmentMethod>().unwrap_err();
        assert_eq!(err.kind(), "UNSUPPORTED_TREATMENT_METHOD");
    }
}
