//! Bundled demo practice (January to March 2024)

use tracing::debug;

use super::DataSource;
use crate::error::{Error, Result};
use crate::import::{detect_upload, fingerprint, parse_statement_csv};
use crate::models::{FileKind, MonthStatements, Period};

const DEMO_FILES: &[(&str, &str)] = &[
    ("2024-01_E.csv", include_str!("../../../../data/demo/2024-01_E.csv")),
    ("2024-01_O.csv", include_str!("../../../../data/demo/2024-01_O.csv")),
    ("2024-02_E.csv", include_str!("../../../../data/demo/2024-02_E.csv")),
    ("2024-02_O.csv", include_str!("../../../../data/demo/2024-02_O.csv")),
    ("2024-03_E.csv", include_str!("../../../../data/demo/2024-03_E.csv")),
    ("2024-03_O.csv", include_str!("../../../../data/demo/2024-03_O.csv")),
];

/// Demo uploads compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoSource;

impl DemoSource {
    pub fn new() -> Self {
        Self
    }

    fn files(&self) -> impl Iterator<Item = (Period, FileKind, &'static str)> {
        DEMO_FILES.iter().filter_map(|(name, content)| {
            detect_upload(name).map(|(period, kind)| (period, kind, *content))
        })
    }
}

impl DataSource for DemoSource {
    fn name(&self) -> &str {
        "demo data"
    }

    fn periods(&self) -> Result<Vec<Period>> {
        let mut periods: Vec<Period> = self.files().map(|(period, _, _)| period).collect();
        periods.sort();
        periods.dedup();
        Ok(periods)
    }

    fn kinds(&self, period: Period) -> Result<Vec<FileKind>> {
        Ok(self
            .files()
            .filter(|(p, _, _)| *p == period)
            .map(|(_, kind, _)| kind)
            .collect())
    }

    fn load(&self, period: Period) -> Result<MonthStatements> {
        let mut month = MonthStatements::default();
        for (_, kind, content) in self.files().filter(|(p, _, _)| *p == period) {
            let mut statement = parse_statement_csv(content.as_bytes())?;
            statement.fingerprint = Some(fingerprint(content.as_bytes()));
            debug!("Demo {} {}: {} line items", period, kind, statement.line_count());
            month.insert(kind, statement);
        }
        if month.employee.is_none() && month.business.is_none() {
            return Err(Error::NotFound(format!("No demo data for {}", period)));
        }
        Ok(month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_periods() {
        let periods = DemoSource::new().periods().unwrap();
        let labels: Vec<String> = periods.iter().map(|p| p.to_string()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_demo_month_has_both_kinds() {
        let source = DemoSource::new();
        let jan = Period::new(2024, 1).unwrap();
        assert_eq!(
            source.kinds(jan).unwrap(),
            vec![FileKind::Employee, FileKind::Business]
        );
        let month = source.load(jan).unwrap();
        let employee = month.employee.unwrap();
        assert_eq!(
            employee.columns,
            vec!["Dr. Patel", "Dr. Chen", "Dr. Alvarez", "All Employees"]
        );
        assert_eq!(month.business.unwrap().columns, vec!["Main Street", "Riverside"]);
    }

    #[test]
    fn test_demo_unknown_month() {
        let result = DemoSource::new().load(Period::new(2023, 1).unwrap());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
