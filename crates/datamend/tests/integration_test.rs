//! Integration tests for datamend.

use std::io::Write;
use tempfile::NamedTempFile;

use datamend::{
    ColumnType, DatamendConfig, DatamendError, DatasetStore, ExportFormat, IntervalKind,
    IntervalRef, PromptResponse, SelectionRequest, Value,
};

/// Helper to create a temporary file with given content.
fn create_test_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn load(content: &str) -> DatasetStore {
    let file = create_test_file(".csv", content);
    let mut store = DatasetStore::new();
    store.load_file(file.path()).expect("Load failed");
    store
}

fn by_id(ids: impl IntoIterator<Item = String>) -> Vec<IntervalRef> {
    ids.into_iter().map(IntervalRef::Id).collect()
}

fn request(columns: &[&str], intervals: Vec<IntervalRef>, method: &str) -> SelectionRequest {
    SelectionRequest {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        intervals,
        method: method.to_string(),
        generation: None,
    }
}

fn numbers(store: &DatasetStore, column: &str) -> Vec<Option<f64>> {
    let ds = store.current().unwrap();
    let index = ds.column_index(column).unwrap();
    ds.column(index).map(Value::as_f64).collect()
}

// =============================================================================
// Upload Tests
// =============================================================================

#[test]
fn test_load_csv_from_disk() {
    let store = load(
        "time,temp\n\
         2024-01-01 00:00:00,1.5\n\
         2024-01-01 00:05:00,2.5\n",
    );

    let source = store.source().unwrap();
    assert_eq!(source.row_count, 2);
    assert_eq!(source.format, "csv");
    assert!(source.hash.starts_with("sha256:"));

    let schema = store.current().unwrap().schema();
    assert_eq!(schema.columns[0].inferred_type, ColumnType::DateTime);
    assert_eq!(schema.columns[1].inferred_type, ColumnType::Numeric);
}

#[test]
fn test_unsorted_rows_are_ordered_by_timestamp() {
    let store = load(
        "time,temp\n\
         2024-01-01 00:10:00,3\n\
         2024-01-01 00:00:00,1\n\
         2024-01-01 00:05:00,2\n",
    );
    assert_eq!(numbers(&store, "temp"), vec![Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn test_explicit_timestamp_column() {
    let mut config = DatamendConfig::default();
    config.timestamp_column = Some("recorded".to_string());
    let mut store = DatasetStore::with_config(config);

    let summary = store
        .upload(
            "two_clocks.csv",
            b"created,recorded,v\n\
              2024-01-01,2024-02-01 00:00:00,1\n\
              2024-01-02,2024-02-01 00:01:00,2\n",
        )
        .unwrap();
    assert_eq!(summary.timestamp_column.as_deref(), Some("recorded"));
    assert_eq!(summary.expected_period_ms, Some(60_000));
}

#[test]
fn test_header_only_upload_fails() {
    let mut store = DatasetStore::new();
    let err = store.upload("header.csv", b"a,b,c\n").unwrap_err();
    assert_eq!(err.kind(), "UPLOAD_ERROR");
    assert!(!store.is_loaded());
}

#[test]
fn test_legacy_excel_rejected() {
    let mut store = DatasetStore::new();
    let err = store.upload("old.xls", b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1junk").unwrap_err();
    assert!(matches!(err, DatamendError::UnsupportedFormat(_)));
}

// =============================================================================
// Detection Tests
// =============================================================================

#[test]
fn test_datetime_gap_example() {
    let mut store = load(
        "time,v\n\
         2024-01-01 00:00:00,1\n\
         2024-01-01 00:05:00,2\n\
         2024-01-01 00:15:00,3\n\
         2024-01-01 00:20:00,4\n",
    );
    let run = store.detect_datetime_gaps().unwrap();

    assert_eq!(run.expected_period_ms, Some(300_000));
    assert_eq!(run.intervals.len(), 1);
    let gap = &run.intervals[0];
    assert_eq!(gap.kind, IntervalKind::DatetimeGap);
    assert_eq!(gap.start.to_string(), "2024-01-01 00:10:00");
    assert_eq!(gap.end.to_string(), "2024-01-01 00:15:00");
    assert_eq!(gap.missing_count, 1);
}

#[test]
fn test_value_gap_example() {
    let mut store = load("temp\n10\nNaN\nNaN\n12\nNaN\n14\n");
    let run = store.detect_value_gaps("temp").unwrap();

    let ranges: Vec<_> = run.intervals.iter().filter_map(|i| i.row_range()).collect();
    assert_eq!(ranges, vec![1..3, 4..5]);
}

#[test]
fn test_detection_is_deterministic() {
    let content = "time,v\n\
                   2024-01-01 00:00:00,1\n\
                   2024-01-01 01:00:00,\n\
                   2024-01-01 04:00:00,3\n";
    let mut a = load(content);
    let mut b = load(content);

    assert_eq!(a.detect_datetime_gaps().unwrap(), b.detect_datetime_gaps().unwrap());
    assert_eq!(a.detect_value_gaps("v").unwrap(), b.detect_value_gaps("v").unwrap());
}

// =============================================================================
// Treatment Tests
// =============================================================================

#[test]
fn test_forward_fill_unresolved_first_row() {
    let mut store = load("temp\nNaN\n5\n6\n");
    let run = store.detect_value_gaps("temp").unwrap();
    let ids = run.intervals.iter().map(|i| i.id.clone());

    let report = store
        .apply_request(&request(&["temp"], by_id(ids), "forward_fill"))
        .unwrap();
    assert_eq!(report.applied_count, 0);
    assert_eq!(report.unresolved_count, 1);
    assert_eq!(numbers(&store, "temp")[0], None);
}

#[test]
fn test_mean_excludes_interval_values() {
    let mut store = load("temp\n2\nNA\nNA\n4\n");
    let run = store.detect_value_gaps("temp").unwrap();
    let ids = run.intervals.iter().map(|i| i.id.clone());

    store
        .apply_request(&request(&["temp"], by_id(ids), "mean"))
        .unwrap();
    assert_eq!(
        numbers(&store, "temp"),
        vec![Some(2.0), Some(3.0), Some(3.0), Some(4.0)]
    );
}

#[test]
fn test_delete_rows_count() {
    let mut store = load("temp,flag\n1,a\nNA,b\nNA,c\n4,d\nNA,e\n");
    let run = store.detect_value_gaps("temp").unwrap();
    let ids: Vec<String> = run.intervals.iter().map(|i| i.id.clone()).collect();

    let report = store
        .apply_request(&request(&["temp"], by_id(ids), "delete_rows"))
        .unwrap();
    assert_eq!(report.rows_deleted, 3);
    assert_eq!(store.current().unwrap().row_count(), 2);
}

#[test]
fn test_forward_fill_is_idempotent_after_redetection() {
    let mut store = load("temp\n1\nNA\n3\nNA\n");
    let run = store.detect_value_gaps("temp").unwrap();
    let ids = run.intervals.iter().map(|i| i.id.clone());
    store
        .apply_request(&request(&["temp"], by_id(ids), "ffill"))
        .unwrap();
    let once = numbers(&store, "temp");

    let rerun = store.detect_value_gaps("temp").unwrap();
    assert!(rerun.intervals.is_empty());
    assert_eq!(numbers(&store, "temp"), once);
}

#[test]
fn test_failed_treatment_leaves_dataset_unchanged() {
    let mut store = load("temp,label\n1,x\nNA,NA\n3,z\n");
    let temp = store.detect_value_gaps("temp").unwrap();
    let label = store.detect_value_gaps("label").unwrap();
    let ids = temp
        .intervals
        .iter()
        .chain(&label.intervals)
        .map(|i| i.id.clone());

    let before = store.current().unwrap().rows().to_vec();
    let err = store
        .apply_request(&request(&["temp", "label"], by_id(ids), "median"))
        .unwrap_err();

    assert_eq!(err.kind(), "UNSUPPORTED_TREATMENT_METHOD");
    assert_eq!(store.current().unwrap().rows(), before.as_slice());
    assert_eq!(store.generation().unwrap(), 0);
}

#[test]
fn test_stale_request_generation() {
    let mut store = load("temp\n1\nNA\n3\n");
    let run = store.detect_value_gaps("temp").unwrap();
    let mut req = request(&["temp"], by_id(run.intervals.iter().map(|i| i.id.clone())), "mean");
    req.generation = Some(7);

    let err = store.apply_request(&req).unwrap_err();
    assert!(matches!(err, DatamendError::StaleGeneration { current: 0, .. }));
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_round_trip_after_treatment() {
    let mut store = load(
        "time,temp,site\n\
         2024-01-01 00:00:00,1.25,a\n\
         2024-01-01 00:05:00,NA,b\n\
         2024-01-01 00:15:00,3,c\n",
    );
    let run = store.detect_datetime_gaps().unwrap();
    let ids = run.intervals.iter().map(|i| i.id.clone());
    store
        .apply_request(&request(&["temp"], by_id(ids), "backward_fill"))
        .unwrap();

    let exported = store.export(Some(ExportFormat::Csv)).unwrap();
    let mut reloaded = DatasetStore::new();
    reloaded.upload(&exported.file_name, &exported.bytes).unwrap();

    let original = store.current().unwrap();
    let copy = reloaded.current().unwrap();
    assert_eq!(copy.column_names(), original.column_names());
    assert_eq!(copy.rows(), original.rows());
    assert_eq!(copy.row_count(), 4);
}

#[test]
fn test_export_round_trip_single_column() {
    let store = load("temp\n10\nNaN\nNaN\n12\nNaN\n14\n");
    let exported = store.export(Some(ExportFormat::Csv)).unwrap();

    let mut reloaded = DatasetStore::new();
    reloaded.upload(&exported.file_name, &exported.bytes).unwrap();
    assert_eq!(reloaded.current().unwrap().row_count(), 6);
    assert_eq!(
        numbers(&reloaded, "temp"),
        vec![Some(10.0), None, None, Some(12.0), None, Some(14.0)]
    );
}

#[test]
fn test_export_round_trip_keeps_all_missing_rows() {
    let store = load("a,b\n1,2\nNA,NA\n3,4\n");
    for format in [ExportFormat::Csv, ExportFormat::Tsv] {
        let exported = store.export(Some(format)).unwrap();

        let mut reloaded = DatasetStore::new();
        reloaded.upload(&exported.file_name, &exported.bytes).unwrap();
        let copy = reloaded.current().unwrap();
        assert_eq!(copy.row_count(), 3);
        assert_eq!(copy.rows(), store.current().unwrap().rows());
    }
}

// =============================================================================
// Prompt Tests
// =============================================================================

#[test]
fn test_single_zscore_outlier() {
    let mut content = String::from("pressure\n");
    for i in 0..40 {
        content.push_str(if i % 2 == 0 { "100\n" } else { "101\n" });
    }
    content.push_str("120\n");
    let store = load(&content);

    let response = store
        .dispatch("outlier analysis where selected variable is 'pressure' using zscore")
        .unwrap();
    let PromptResponse::Plot(figure) = response else {
        panic!("expected a plot, got {:?}", response);
    };
    assert_eq!(figure["meta"]["flagged_rows"], serde_json::json!([40]));
}

#[test]
fn test_unknown_prompt() {
    let store = load("v\n1\n2\n");
    let err = store.dispatch("please fix everything").unwrap_err();
    assert_eq!(err.kind(), "PROMPT_PARSE_ERROR");
}
