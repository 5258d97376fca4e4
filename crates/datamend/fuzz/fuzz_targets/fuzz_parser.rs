//! Fuzz target for upload parsing.
//!
//! Checks that parsing, type inference and timestamp ordering never panic
//! on arbitrary bytes, whichever format the file name implies.

#![no_main]

use datamend::{Dataset, Parser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 100_000 {
        return;
    }

    let parser = Parser::new();
    for name in ["fuzz.csv", "fuzz.tsv", "fuzz.xlsx"] {
        if let Ok((table, _)) = parser.parse_bytes(name, data) {
            let _ = Dataset::from_table(table, None);
        }
    }
});
