//! Property-based tests for detection and treatment.
//!
//! These tests use proptest to generate random columns with missing cells and
//! random timestamp sequences, and verify that detection and treatment keep
//! their invariants under all of them.
//!
//! # Testing Philosophy
//!
//! Property-based tests verify:
//! 1. **No panics**: Parsing, detection and prompt classification never crash
//! 2. **Determinism**: Same input always produces the same intervals
//! 3. **Coverage**: Value-gap intervals cover exactly the missing cells
//! 4. **Invariants**: Fills only write missing cells; deletes remove exactly
//!    the detected rows; failed treatments change nothing
//!
//! # Running Property Tests
//!
//! ```bash
//! # Run all property tests
//! cargo test -p datamend --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p datamend --test property_tests
//! ```

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use datamend::prompt::classify;
use datamend::{
    Dataset, DatasetStore, ExportFormat, IntervalDetector, IntervalRef, Parser, SelectionRequest,
    Value,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// A numeric column where `None` marks a missing cell.
fn sparse_column() -> impl Strategy<Value = Vec<Option<i32>>> {
    prop::collection::vec(
        prop_oneof![
            3 => (-1000i32..1000).prop_map(Some),
            1 => Just(None),
        ],
        1..60,
    )
}

/// Minute offsets between consecutive timestamps, mostly regular.
fn timestamp_steps() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(
        prop_oneof![
            6 => Just(5u32),
            1 => 6u32..60,
        ],
        1..40,
    )
}

/// Free-form prompt text, occasionally shaped like a real request.
fn prompt_like() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 '\"_\\-\\.]{0,80}",
        "(variability|missing value|outlier) analysis where selected variable is '[a-z]{1,8}'( using [a-z]{2,6})?",
        "summar(ize|ise|y)[ a-z]{0,20}",
    ]
}

fn column_csv(values: &[Option<i32>]) -> String {
    let mut csv = String::from("v\n");
    for value in values {
        match value {
            Some(v) => csv.push_str(&format!("{}\n", v)),
            None => csv.push_str("NA\n"),
        }
    }
    csv
}

fn series_csv(steps: &[u32]) -> String {
    let mut ts = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut csv = format!("time,v\n{},0\n", ts.format("%Y-%m-%d %H:%M:%S"));
    for (i, step) in steps.iter().enumerate() {
        ts += Duration::minutes(i64::from(*step));
        csv.push_str(&format!("{},{}\n", ts.format("%Y-%m-%d %H:%M:%S"), i + 1));
    }
    csv
}

fn dataset(csv: &str) -> Dataset {
    let (table, _) = Parser::new().parse_bytes("prop.csv", csv.as_bytes()).unwrap();
    Dataset::from_table(table, None).unwrap()
}

fn has_values(values: &[Option<i32>]) -> bool {
    values.iter().any(Option::is_some)
}

// =============================================================================
// Detection Properties
// =============================================================================

proptest! {
    #[test]
    fn value_gaps_cover_exactly_the_missing_cells(values in sparse_column()) {
        prop_assume!(has_values(&values));
        let ds = dataset(&column_csv(&values));
        let run = IntervalDetector::new().detect_value_gaps(&ds, "v", 0).unwrap();

        let mut covered = vec![false; values.len()];
        for interval in &run.intervals {
            let range = interval.row_range().unwrap();
            prop_assert!(range.start < range.end);
            prop_assert_eq!(interval.missing_count, range.len());
            for row in range {
                prop_assert!(!covered[row], "intervals overlap at row {}", row);
                covered[row] = true;
            }
        }
        for (row, value) in values.iter().enumerate() {
            prop_assert_eq!(covered[row], value.is_none());
        }
    }

    #[test]
    fn value_gaps_are_maximal(values in sparse_column()) {
        prop_assume!(has_values(&values));
        let ds = dataset(&column_csv(&values));
        let run = IntervalDetector::new().detect_value_gaps(&ds, "v", 0).unwrap();

        for pair in run.intervals.windows(2) {
            let (a, b) = (pair[0].row_range().unwrap(), pair[1].row_range().unwrap());
            prop_assert!(a.end < b.start, "adjacent runs should have merged");
        }
    }

    #[test]
    fn datetime_detection_is_deterministic(steps in timestamp_steps()) {
        let csv = series_csv(&steps);
        let a = dataset(&csv);
        let b = dataset(&csv);
        let detector = IntervalDetector::new();
        prop_assert_eq!(
            detector.detect_datetime_gaps(&a, 0).unwrap(),
            detector.detect_datetime_gaps(&b, 0).unwrap()
        );
    }

    #[test]
    fn datetime_gaps_are_ordered_and_disjoint(steps in timestamp_steps()) {
        let ds = dataset(&series_csv(&steps));
        let run = IntervalDetector::new().detect_datetime_gaps(&ds, 0).unwrap();

        for interval in &run.intervals {
            let (start, end) = interval.time_range().unwrap();
            prop_assert!(start < end);
            prop_assert!(interval.missing_count >= 1);
        }
        for pair in run.intervals.windows(2) {
            prop_assert!(pair[0].time_range().unwrap().1 <= pair[1].time_range().unwrap().0);
        }
    }
}

// =============================================================================
// Treatment Properties
// =============================================================================

fn treat(values: &[Option<i32>], method: &str) -> (DatasetStore, datamend::Result<datamend::TreatmentReport>) {
    let mut store = DatasetStore::new();
    store.upload("prop.csv", column_csv(values).as_bytes()).unwrap();
    let run = store.detect_value_gaps("v").unwrap();
    let request = SelectionRequest {
        columns: vec!["v".to_string()],
        intervals: run.intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
        method: method.to_string(),
        generation: Some(run.generation),
    };
    let result = store.apply_request(&request);
    (store, result)
}

fn column(store: &DatasetStore) -> Vec<Option<f64>> {
    store.current().unwrap().column(0).map(Value::as_f64).collect()
}

proptest! {
    #[test]
    fn fills_never_change_present_values(
        values in sparse_column(),
        method in prop_oneof![
            Just("forward_fill"),
            Just("backward_fill"),
            Just("mean"),
            Just("median"),
        ],
    ) {
        prop_assume!(has_values(&values));
        prop_assume!(values.iter().any(Option::is_none));

        let (store, result) = treat(&values, method);
        let report = result.unwrap();
        let after = column(&store);

        prop_assert_eq!(after.len(), values.len());
        for (before, after) in values.iter().zip(&after) {
            if let Some(v) = before {
                prop_assert_eq!(*after, Some(*v as f64));
            }
        }
        let missing = values.iter().filter(|v| v.is_none()).count();
        prop_assert_eq!(report.applied_count + report.unresolved_count, missing);
        prop_assert_eq!(report.generation, 1);
    }

    #[test]
    fn mean_and_median_resolve_every_cell(values in sparse_column()) {
        prop_assume!(has_values(&values));
        prop_assume!(values.iter().any(Option::is_none));

        for method in ["mean", "median"] {
            let (store, result) = treat(&values, method);
            prop_assert_eq!(result.unwrap().unresolved_count, 0);
            prop_assert!(column(&store).iter().all(Option::is_some));
        }
    }

    #[test]
    fn delete_removes_exactly_the_missing_rows(values in sparse_column()) {
        prop_assume!(has_values(&values));
        prop_assume!(values.iter().any(Option::is_none));

        let (store, result) = treat(&values, "delete_rows");
        let missing = values.iter().filter(|v| v.is_none()).count();

        prop_assert_eq!(result.unwrap().rows_deleted, missing);
        let expected: Vec<Option<f64>> = values.iter().flatten().map(|v| Some(*v as f64)).collect();
        prop_assert_eq!(column(&store), expected);
    }

    #[test]
    fn forward_fill_twice_is_a_no_op(values in sparse_column()) {
        prop_assume!(has_values(&values));
        prop_assume!(values.iter().any(Option::is_none));

        let (mut store, result) = treat(&values, "forward_fill");
        result.unwrap();
        let once = column(&store);

        let rerun = store.detect_value_gaps("v").unwrap();
        if !rerun.intervals.is_empty() {
            let request = SelectionRequest {
                columns: vec!["v".to_string()],
                intervals: rerun.intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
                method: "forward_fill".to_string(),
                generation: Some(rerun.generation),
            };
            let report = store.apply_request(&request).unwrap();
            prop_assert_eq!(report.applied_count, 0);
        }
        prop_assert_eq!(column(&store), once);
    }
}

// =============================================================================
// Export Properties
// =============================================================================

proptest! {
    #[test]
    fn export_then_upload_preserves_rows(
        values in sparse_column(),
        format in prop_oneof![Just(ExportFormat::Csv), Just(ExportFormat::Tsv)],
    ) {
        prop_assume!(has_values(&values));
        let mut store = DatasetStore::new();
        store.upload("prop.csv", column_csv(&values).as_bytes()).unwrap();
        let exported = store.export(Some(format)).unwrap();

        let mut reloaded = DatasetStore::new();
        reloaded.upload(&exported.file_name, &exported.bytes).unwrap();
        prop_assert_eq!(reloaded.current().unwrap().row_count(), values.len());
        prop_assert_eq!(column(&reloaded), column(&store));
    }
}

// =============================================================================
// Robustness Properties
// =============================================================================

proptest! {
    #[test]
    fn parser_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Parser::new().parse_bytes("fuzz.csv", &bytes);
    }

    #[test]
    fn classify_never_panics(prompt in prompt_like()) {
        let _ = classify(&prompt);
    }

    #[test]
    fn classify_is_deterministic(prompt in prompt_like()) {
        let a = classify(&prompt).map_err(|e| e.to_string());
        let b = classify(&prompt).map_err(|e| e.to_string());
        prop_assert_eq!(a, b);
    }
}
