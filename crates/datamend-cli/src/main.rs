//! Datamend CLI - gap detection and treatment for tabular time series.

mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use datamend::DatamendConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(&cli).and_then(|config| match cli.command {
        Commands::Serve { host, port } => commands::serve::run(config, host, port),

        Commands::Detect { file, column, json } => {
            commands::detect::run(config, file, column, json, cli.verbose)
        }

        Commands::Treat {
            file,
            method,
            columns,
            value_gaps,
            output,
            format,
        } => commands::treat::run(
            config, file, method, columns, value_gaps, output, format, cli.verbose,
        ),

        Commands::Ask { file, prompt } => commands::ask::run(config, file, prompt),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "datamend=debug,datamend_cli=debug,tower_http=debug"
    } else {
        "datamend=info,datamend_cli=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .init();
}

fn load_config(cli: &Cli) -> Result<DatamendConfig, Box<dyn std::error::Error>> {
    match &cli.config {
        Some(path) => Ok(DatamendConfig::from_json_file(path)?),
        None => Ok(DatamendConfig::default()),
    }
}
