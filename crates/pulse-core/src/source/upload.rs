//! Directory of saved uploads

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::DataSource;
use crate::error::{Error, Result};
use crate::import::{detect_upload, parse_statement_file};
use crate::models::{FileKind, MonthStatements, Period};

#[derive(Debug, Clone, Default)]
struct MonthFiles {
    employee: Option<PathBuf>,
    business: Option<PathBuf>,
}

impl MonthFiles {
    fn slot(&mut self, kind: FileKind) -> &mut Option<PathBuf> {
        match kind {
            FileKind::Employee => &mut self.employee,
            FileKind::Business => &mut self.business,
        }
    }
}

/// Uploads stored as `YYYY-MM_E.csv` / `YYYY-MM_O.csv` in one directory
///
/// The directory is scanned once at construction; files whose names are not
/// recognised are ignored.
pub struct UploadDirSource {
    label: String,
    files: BTreeMap<Period, MonthFiles>,
}

impl UploadDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Upload directory not found: {}",
                dir.display()
            )));
        }

        let mut names: Vec<(String, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push((name.to_string(), path.clone()));
            }
        }
        names.sort();

        let mut files: BTreeMap<Period, MonthFiles> = BTreeMap::new();
        for (name, path) in names {
            let Some((period, kind)) = detect_upload(&name) else {
                debug!("Ignoring {}", name);
                continue;
            };
            let slot = files.entry(period).or_default().slot(kind);
            if let Some(previous) = slot.as_ref() {
                warn!(
                    "Multiple {} files for {}: using {} over {}",
                    kind,
                    period,
                    name,
                    previous.display()
                );
            }
            *slot = Some(path);
        }

        let label = format!("uploads in {}", dir.display());
        Ok(Self { label, files })
    }
}

impl DataSource for UploadDirSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn periods(&self) -> Result<Vec<Period>> {
        Ok(self.files.keys().copied().collect())
    }

    fn kinds(&self, period: Period) -> Result<Vec<FileKind>> {
        let files = self
            .files
            .get(&period)
            .ok_or_else(|| Error::NotFound(format!("No uploads for {}", period)))?;
        let mut kinds = Vec::new();
        if files.employee.is_some() {
            kinds.push(FileKind::Employee);
        }
        if files.business.is_some() {
            kinds.push(FileKind::Business);
        }
        Ok(kinds)
    }

    /// Files that fail to parse are logged and left out of the month
    fn load(&self, period: Period) -> Result<MonthStatements> {
        let files = self
            .files
            .get(&period)
            .ok_or_else(|| Error::NotFound(format!("No uploads for {}", period)))?;

        let mut month = MonthStatements::default();
        for (kind, path) in [
            (FileKind::Employee, &files.employee),
            (FileKind::Business, &files.business),
        ] {
            let Some(path) = path else { continue };
            match parse_statement_file(path) {
                Ok(statement) => month.insert(kind, statement),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(month)
    }
}
