//! Shared command utilities: config loading, source selection, formatting

use std::path::Path;

use anyhow::{bail, Context, Result};
use pulse_core::{Aggregator, DataSource, DemoSource, Period, RollupConfig, UploadDirSource};
use serde::Serialize;
use tracing::debug;

use crate::cli::SourceArgs;

/// Load the rollup config and compile its classifier
pub fn load_aggregator(config: Option<&Path>) -> Result<Aggregator> {
    let config = RollupConfig::load(config).context("Failed to load rollup config")?;
    debug!(
        "Rollup config: {} classifier rules, {} departments",
        config.classifier_rules.len(),
        config.business.departments.len()
    );
    Aggregator::new(config).context("Invalid rollup config")
}

/// Pick the upload directory or the demo data
pub fn open_source(args: &SourceArgs) -> Result<Box<dyn DataSource>> {
    match (&args.dir, args.demo) {
        (_, true) => Ok(Box::new(DemoSource::new())),
        (Some(dir), false) => {
            let source = UploadDirSource::new(dir)
                .with_context(|| format!("Failed to open upload directory {}", dir.display()))?;
            Ok(Box::new(source))
        }
        (None, false) => bail!("Specify an upload directory with --dir, or use --demo"),
    }
}

/// Parse repeated `--month YYYY-MM` arguments
pub fn parse_months(months: &[String]) -> Result<Vec<Period>> {
    months
        .iter()
        .map(|m| m.parse::<Period>().map_err(|e| anyhow::anyhow!(e)))
        .collect()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Format an amount as currency with thousands separators, e.g. "-$1,234.50"
pub fn money(amount: f64) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, fraction)
}
