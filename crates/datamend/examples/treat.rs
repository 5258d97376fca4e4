//! Example: Detect and treat gaps in a time series with datamend.
//!
//! Usage:
//!   cargo run --example treat -- <file_path> [method]
//!
//! Example:
//!   cargo run --example treat -- sensors.csv forward_fill

use std::env;
use std::path::Path;

use datamend::{DatasetStore, ExportFormat, IntervalRef, SelectionRequest};

fn main() -> datamend::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example treat -- <file_path> [method]");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example treat -- sensors.csv forward_fill");
        std::process::exit(1);
    }

    let path = Path::new(&args[1]);
    let method = args.get(2).map(String::as_str).unwrap_or("forward_fill");

    if !path.exists() {
        eprintln!("Error: File not found: {}", path.display());
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("datamend: {}", path.display());
    println!("{}", separator);
    println!();

    let mut store = DatasetStore::new();
    let summary = store.load_file(path)?;

    println!("## Upload");
    println!("  Rows: {}", summary.rows);
    println!("  Columns: {}", summary.columns.join(", "));
    println!(
        "  Timestamp: {}",
        summary.timestamp_column.as_deref().unwrap_or("(none)")
    );
    println!();

    let run = store.detect_datetime_gaps()?;
    println!("## Datetime gaps ({})", run.intervals.len());
    for interval in &run.intervals {
        println!(
            "  {:40} {} -> {} ({} missing)",
            interval.id, interval.start, interval.end, interval.missing_count
        );
    }
    println!();

    if run.intervals.is_empty() {
        println!("Nothing to treat.");
        return Ok(());
    }

    let columns: Vec<String> = store
        .columns()?
        .into_iter()
        .filter(|c| Some(c) != summary.timestamp_column.as_ref())
        .collect();
    let request = SelectionRequest {
        columns,
        intervals: run.intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
        method: method.to_string(),
        generation: Some(run.generation),
    };

    let report = store.apply_request(&request)?;
    println!("## Treatment");
    println!("  {}", report.message());
    println!();

    let exported = store.export(Some(ExportFormat::Csv))?;
    println!("## Export");
    println!("  {} ({} bytes)", exported.file_name, exported.bytes.len());
    println!("{}", separator);

    Ok(())
}
