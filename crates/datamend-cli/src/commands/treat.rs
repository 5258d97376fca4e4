//! Treat command - detect gaps, treat them, and export the result.

use std::path::PathBuf;

use colored::Colorize;
use datamend::{DatamendConfig, DatasetStore, ExportFormat, IntervalRef, SelectionRequest};

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: DatamendConfig,
    file: PathBuf,
    method: String,
    columns: Vec<String>,
    value_gaps: bool,
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = DatasetStore::with_config(config);
    let summary = store.load_file(&file)?;

    let columns = if columns.is_empty() {
        default_columns(&store, &method)?
    } else {
        columns
    };
    if verbose {
        println!(
            "{} {} ({} rows) columns: {}",
            "Loaded".cyan().bold(),
            summary.file,
            summary.rows,
            columns.join(", ")
        );
    }

    let mut intervals = Vec::new();
    if value_gaps {
        for column in &columns {
            let run = store.detect_value_gaps(column)?;
            intervals.extend(run.intervals);
        }
    } else {
        intervals = store.detect_datetime_gaps()?.intervals;
    }

    if verbose {
        for interval in &intervals {
            println!("  {} {}", interval.id.dimmed(), interval);
        }
    }

    if intervals.is_empty() {
        println!("{} Nothing to treat.", "Note:".yellow());
        return Ok(());
    }

    let request = SelectionRequest {
        columns: if value_gaps || method_needs_columns(&method) {
            columns
        } else {
            Vec::new()
        },
        intervals: intervals.iter().map(|i| IntervalRef::Id(i.id.clone())).collect(),
        method,
        generation: Some(store.generation()?),
    };
    let report = store.apply_request(&request)?;

    println!("{} {}", "Treated:".green().bold(), report.message());

    let exported = store.export(format)?;
    let output_path = output.unwrap_or_else(|| file.with_file_name(&exported.file_name));
    std::fs::write(&output_path, &exported.bytes)?;

    println!(
        "{} {}",
        "Saved".cyan().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}

/// Every non-timestamp column; numeric ones only for mean and median.
fn default_columns(store: &DatasetStore, method: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let statistical = method
        .parse::<datamend::TreatmentMethod>()
        .is_ok_and(|m| m.is_statistical());
    let schema = store.current()?.schema();

    Ok(schema
        .columns
        .iter()
        .filter(|c| Some(c.position) != schema.timestamp_column)
        .filter(|c| !statistical || c.inferred_type.is_numeric())
        .map(|c| c.name.clone())
        .collect())
}

/// Deleting datetime gaps needs no column list; every other method does.
fn method_needs_columns(method: &str) -> bool {
    method
        .parse::<datamend::TreatmentMethod>()
        .map(|m| m.is_fill())
        .unwrap_or(true)
}
