//! Where monthly statements come from
//!
//! # Architecture
//!
//! - `DataSource` trait lists available periods and loads one month
//! - `UploadDirSource` reads uploads saved in a directory
//! - `DemoSource` serves the bundled three-month demo practice
//!
//! Uploads are recognised by file name (`2024-01_E.csv`, `2024-01_O.csv`);
//! see [`crate::import::detect_upload`].

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{FileKind, MonthStatements, Period};

mod demo;
mod upload;

pub use demo::DemoSource;
pub use upload::UploadDirSource;

/// Trait for statement providers
pub trait DataSource {
    /// Human-readable name for this source
    fn name(&self) -> &str;

    /// Months with at least one upload, oldest first
    fn periods(&self) -> Result<Vec<Period>>;

    /// File kinds present for a month
    fn kinds(&self, period: Period) -> Result<Vec<FileKind>>;

    /// Parse the E and O statements for one month
    fn load(&self, period: Period) -> Result<MonthStatements>;
}

/// Load every month the source knows about
pub fn load_all(source: &dyn DataSource) -> Result<BTreeMap<Period, MonthStatements>> {
    load_selected(source, &[])
}

/// Load the given months (all months when `periods` is empty)
///
/// Statements with identical content under different names are loaded but
/// reported, since they usually mean a file was uploaded twice. Months that
/// fail to load or come back empty are logged and left out.
pub fn load_selected(
    source: &dyn DataSource,
    periods: &[Period],
) -> Result<BTreeMap<Period, MonthStatements>> {
    let available = source.periods()?;
    let wanted: Vec<Period> = if periods.is_empty() {
        available
    } else {
        for period in periods {
            if !available.contains(period) {
                warn!("No uploads for {} in {}", period, source.name());
            }
        }
        available
            .into_iter()
            .filter(|p| periods.contains(p))
            .collect()
    };

    let mut months = BTreeMap::new();
    let mut seen: HashMap<String, (Period, FileKind)> = HashMap::new();

    for period in wanted {
        let month = match source.load(period) {
            Ok(month) if !month.is_empty() => month,
            Ok(_) => {
                warn!("No readable statements for {} in {}", period, source.name());
                continue;
            }
            Err(e) => {
                warn!("Skipping {} from {}: {}", period, source.name(), e);
                continue;
            }
        };
        for kind in [FileKind::Employee, FileKind::Business] {
            let fingerprint = month.get(kind).and_then(|s| s.fingerprint.clone());
            if let Some(fingerprint) = fingerprint {
                if let Some((first_period, first_kind)) = seen.get(&fingerprint) {
                    warn!(
                        "{} {} file is identical to {} {} file",
                        period,
                        kind.code(),
                        first_period,
                        first_kind.code()
                    );
                } else {
                    seen.insert(fingerprint, (period, kind));
                }
            }
        }
        debug!("Loaded {} from {}", period, source.name());
        months.insert(period, month);
    }

    info!("Loaded {} month(s) from {}", months.len(), source.name());
    Ok(months)
}
