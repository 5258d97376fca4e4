//! Treatment selections and their wire form.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::method::TreatmentMethod;
use crate::dataset::Dataset;
use crate::detection::{Interval, IntervalRef, IntervalRegistry};
use crate::error::{DatamendError, Result};

/// A treatment request as received from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub intervals: Vec<IntervalRef>,
    pub method: String,
    /// Generation the client detected against, if it tracks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

impl SelectionRequest {
    /// Resolve column names and interval references against the latest
    /// detector output for `dataset`.
    pub fn resolve(&self, dataset: &Dataset, registry: &IntervalRegistry) -> Result<Selection> {
        let method: TreatmentMethod = self.method.parse()?;

        if let Some(requested) = self.generation {
            if requested != dataset.generation() {
                return Err(DatamendError::StaleGeneration {
                    what: format!("selection for generation {}", requested),
                    current: dataset.generation(),
                });
            }
        }

        let mut columns = IndexSet::new();
        for name in &self.columns {
            let index = dataset.resolve_column(name)?;
            columns.insert(dataset.schema().columns[index].name.clone());
        }

        let mut intervals: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        for reference in &self.intervals {
            let interval = registry.resolve(reference, dataset.generation())?;
            if !intervals.iter().any(|i| i.id == interval.id) {
                intervals.push(interval);
            }
        }

        Ok(Selection {
            columns,
            intervals,
            method,
        })
    }
}

/// A validated treatment request: columns x intervals x method.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub columns: IndexSet<String>,
    pub intervals: Vec<Interval>,
    pub method: TreatmentMethod,
}

impl Selection {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        intervals: Vec<Interval>,
        method: TreatmentMethod,
    ) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            intervals,
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::IntervalDetector;
    use crate::input::Parser;

    fn dataset() -> Dataset {
        let (table, _) = Parser::new()
            .parse_bytes("t.csv", b"Temp,other\n1,a\nNA,b\n3,c\n")
            .unwrap();
        Dataset::from_table(table, None).unwrap()
    }

    #[test]
    fn test_resolve_request() {
        let ds = dataset();
        let mut registry = IntervalRegistry::new();
        let run = IntervalDetector::new().detect_value_gaps(&ds, "Temp", 0).unwrap();
        registry.record(&run);

        let request: SelectionRequest = serde_json::from_str(&format!(
            r#"{{"columns": ["temp"], "intervals": ["{id}", "{id}"], "method": "ffill"}}"#,
            id = run.intervals[0].id
        ))
        .unwrap();

        let selection = request.resolve(&ds, &registry).unwrap();
        assert_eq!(selection.method, TreatmentMethod::ForwardFill);
        assert_eq!(selection.columns.iter().collect::<Vec<_>>(), vec!["Temp"]);
        assert_eq!(selection.intervals.len(), 1);
    }

    #[test]
    fn test_request_generation_must_match() {
        let ds = dataset();
        let request = SelectionRequest {
            columns: vec!["Temp".into()],
            intervals: vec![],
            method: "mean".into(),
            generation: Some(4),
        };
        assert!(matches!(
            request.resolve(&ds, &IntervalRegistry::new()),
            Err(DatamendError::StaleGeneration { .. })
        ));
    }

    #[test]
    fn test_unknown_method_rejected_before_lookup() {
        let ds = dataset();
        let request = SelectionRequest {
            columns: vec!["nope".into()],
            intervals: vec![],
            method: "spline".into(),
            generation: None,
        };
        assert!(matches!(
            request.resolve(&ds, &IntervalRegistry::new()),
            Err(DatamendError::UnsupportedTreatmentMethod { .. })
        ));
    }
}
