//! Ask command - run an analysis prompt from the terminal.

use std::path::PathBuf;

use colored::Colorize;
use datamend::{DatamendConfig, DatasetStore, PromptResponse};

pub fn run(
    config: DatamendConfig,
    file: PathBuf,
    prompt: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = DatasetStore::with_config(config);
    store.load_file(&file)?;

    match store.dispatch(&prompt)? {
        PromptResponse::Text(text) => println!("{}", text),
        PromptResponse::Plot(figure) => {
            if let Some(meta) = figure.get("meta") {
                println!("{}", "Plot metadata:".cyan().bold());
                println!("{}", serde_json::to_string_pretty(meta)?);
            }
            println!(
                "{} the full figure is available from the /chat endpoint.",
                "Note:".yellow()
            );
        }
        PromptResponse::Image(image) => println!("{}", image.content),
    }

    Ok(())
}
