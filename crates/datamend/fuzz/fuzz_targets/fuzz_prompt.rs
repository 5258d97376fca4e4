//! Fuzz target for prompt classification and dispatch.
//!
//! The regex table must never panic, and a classified prompt must dispatch
//! to either a response or a typed error.

#![no_main]

use datamend::prompt::classify;
use datamend::DatasetStore;
use libfuzzer_sys::fuzz_target;

const SAMPLE: &[u8] = b"time,temp,site\n\
2024-01-01 00:00:00,1.5,a\n\
2024-01-01 00:05:00,,b\n\
2024-01-01 00:15:00,3.5,c\n";

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(prompt) = std::str::from_utf8(data) {
        if classify(prompt).is_ok() {
            let mut store = DatasetStore::new();
            if store.upload("sample.csv", SAMPLE).is_ok() {
                let _ = store.dispatch(prompt);
            }
        }
    }
});
