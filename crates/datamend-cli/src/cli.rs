//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use datamend::ExportFormat;

/// Datamend: detect and treat gaps in tabular time series
#[derive(Parser)]
#[command(name = "datamend")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true, env = "DATAMEND_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port for web server
        #[arg(short, long, env = "PORT", default_value = "8000")]
        port: u16,
    },

    /// Report datetime gaps, or value gaps of one column
    Detect {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Report missing-value runs in this column instead of datetime gaps
        #[arg(long)]
        column: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Detect gaps and treat them, writing the result
    Treat {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// forward_fill, backward_fill, mean, median or delete_rows
        #[arg(short, long)]
        method: String,

        /// Columns to treat (default: every column except the timestamp)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Treat missing-value runs of the selected columns instead of datetime gaps
        #[arg(long)]
        value_gaps: bool,

        /// Output path (default: <stem>_treated.<format> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv, tsv, or json
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },

    /// Run an analysis prompt against a file
    Ask {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// e.g. "outlier analysis where selected variable is 'temp' using iqr"
        #[arg(value_name = "PROMPT")]
        prompt: String,
    },
}
