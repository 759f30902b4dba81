//! Pulse CLI - Practice financial reporting
//!
//! Usage:
//!   pulse tree --file 2024-01_E.csv        Print the statement tree
//!   pulse kpis --file 2024-01_O.csv        Headline figures for one export
//!   pulse rollup --dir uploads --kind o    Department roll-up
//!   pulse dashboard --demo                 Dashboard over the demo data

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Tree { file, json } => commands::cmd_tree(&file, json),
        Commands::Kpis { file, json } => {
            let aggregator = commands::load_aggregator(config)?;
            commands::cmd_kpis(&file, &aggregator, json)
        }
        Commands::Rollup {
            source,
            kind,
            month,
            json,
        } => {
            let aggregator = commands::load_aggregator(config)?;
            let source = commands::open_source(&source)?;
            commands::cmd_rollup(source.as_ref(), &aggregator, &kind, &month, json)
        }
        Commands::Trend { source, json } => {
            let aggregator = commands::load_aggregator(config)?;
            let source = commands::open_source(&source)?;
            commands::cmd_trend(source.as_ref(), &aggregator, json)
        }
        Commands::Dashboard {
            source,
            limit,
            json,
        } => {
            let aggregator = commands::load_aggregator(config)?;
            let source = commands::open_source(&source)?;
            commands::cmd_dashboard(source.as_ref(), &aggregator, limit, json)
        }
        Commands::Months { source } => {
            let source = commands::open_source(&source)?;
            commands::cmd_months(source.as_ref())
        }
    }
}
