//! Serve command - run the HTTP API.

use colored::Colorize;
use datamend::{DatamendConfig, DatasetStore};

use crate::server::{app, state::AppState};

pub fn run(config: DatamendConfig, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(DatasetStore::with_config(config));

    println!();
    println!(
        "{} {}",
        "Starting datamend server at".cyan().bold(),
        format!("http://{}:{}", host, port).white().bold()
    );
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, &host, port))
}
