//! Portfolio harvester CLI.
//!
//! Harvests the EQT portfolio listings and company pages, joins them with
//! a reference organization dataset, attaches funding rounds, and writes
//! the enriched records to a timestamped JSON file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
