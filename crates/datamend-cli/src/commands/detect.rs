//! Detect command - report gaps in a data file.

use std::path::PathBuf;

use colored::Colorize;
use datamend::{DatamendConfig, DatasetStore};

pub fn run(
    config: DatamendConfig,
    file: PathBuf,
    column: Option<String>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = DatasetStore::with_config(config);
    let summary = store.load_file(&file)?;

    let run = match &column {
        Some(column) => store.detect_value_gaps(column)?,
        None => store.detect_datetime_gaps()?,
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows, {} columns)",
        "Detecting gaps in".cyan().bold(),
        summary.file.white(),
        summary.rows,
        summary.columns.len()
    );
    if verbose {
        println!("  Hash: {}", summary.hash);
    }

    match (&run.column, &summary.timestamp_column) {
        (Some(column), _) => println!("  Column: {}", column.white().bold()),
        (None, Some(ts)) => {
            let period = run
                .expected_period_ms
                .map(datamend::inference::format_period)
                .unwrap_or_else(|| "unknown".to_string());
            println!("  Timestamp column: {} (period {})", ts.white().bold(), period);
        }
        (None, None) => {
            println!(
                "{} No timestamp column; use --column to find missing values.",
                "Note:".yellow()
            );
            return Ok(());
        }
    }
    println!();

    if run.intervals.is_empty() {
        println!("{}", "No gaps found.".green());
        return Ok(());
    }

    let missing: usize = run.intervals.iter().map(|i| i.missing_count).sum();
    println!(
        "{} {} interval(s), {} missing",
        "Found".yellow().bold(),
        run.intervals.len().to_string().white().bold(),
        missing
    );
    for interval in &run.intervals {
        println!(
            "  {} [{}, {})  {} missing",
            interval.id.dimmed(),
            interval.start,
            interval.end,
            interval.missing_count
        );
    }

    Ok(())
}
