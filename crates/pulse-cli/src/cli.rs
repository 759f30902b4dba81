//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pulse - Practice financial reporting from monthly statement exports
#[derive(Parser)]
#[command(name = "pulse")]
#[command(about = "Financial dashboards from clinic E/O statement exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Rollup config file (defaults to the data-dir override, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where monthly uploads are read from
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory of uploads named like 2024-01_E.csv / 2024-01_O.csv
    #[arg(short, long, conflicts_with = "demo")]
    pub dir: Option<PathBuf>,

    /// Use the bundled demo practice instead of uploads
    #[arg(long)]
    pub demo: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the line-item tree of one export
    Tree {
        /// CSV export to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show revenue, expenses and net income for one export
    Kpis {
        /// CSV export to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Roll up providers (E files) or departments (O files) across months
    Rollup {
        #[command(flatten)]
        source: SourceArgs,

        /// Entity kind: employee (E) or business (O)
        #[arg(short, long, default_value = "employee")]
        kind: String,

        /// Only include these months (YYYY-MM, repeatable)
        #[arg(short, long)]
        month: Vec<String>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the monthly margin trend
    Trend {
        #[command(flatten)]
        source: SourceArgs,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the full dashboard (KPIs, trend, mix, top performers)
    Dashboard {
        #[command(flatten)]
        source: SourceArgs,

        /// Number of top performers to list
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List months with uploads and which files each has
    Months {
        #[command(flatten)]
        source: SourceArgs,
    },
}
