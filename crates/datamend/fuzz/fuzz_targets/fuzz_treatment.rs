//! Fuzz target for treatment over arbitrary uploads.
//!
//! Detects value gaps in every column and applies the method picked by the
//! first byte. A rejected treatment must leave the dataset untouched.

#![no_main]

use datamend::{DatasetStore, IntervalRef, SelectionRequest};
use libfuzzer_sys::fuzz_target;

const METHODS: [&str; 5] = ["forward_fill", "backward_fill", "mean", "median", "delete_rows"];

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > 50_000 {
        return;
    }

    let method = METHODS[usize::from(data[0]) % METHODS.len()];
    let mut store = DatasetStore::new();
    if store.upload("fuzz.csv", &data[1..]).is_err() {
        return;
    }

    let columns = store.columns().unwrap_or_default();
    for column in columns {
        let Ok(run) = store.detect_value_gaps(&column) else {
            continue;
        };
        if run.intervals.is_empty() {
            continue;
        }

        let before = store.current().map(|ds| ds.rows().to_vec()).ok();
        let request = SelectionRequest {
            columns: vec![column],
            intervals: run.intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
            method: method.to_string(),
            generation: Some(run.generation),
        };
        if store.apply_request(&request).is_err() {
            let after = store.current().map(|ds| ds.rows().to_vec()).ok();
            assert_eq!(before, after, "rejected treatment modified the dataset");
        }
    }
});
