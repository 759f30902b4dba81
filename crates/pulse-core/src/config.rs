//! Rollup configuration
//!
//! Holds every business assumption the aggregator relies on: classifier
//! rules, which E-file columns are summaries, the department catalogue for
//! O files, the materiality threshold and the assumed expense ratio for
//! departments without matched expenses.
//!
//! ## Configuration Resolution
//!
//! 1. Explicit path (`--config`), when it exists
//! 2. Override in data dir (~/.local/share/pulse/config/rollup.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::classify::{default_rules, Classifier, ClassifierRule};
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/rollup.toml");

/// Employee (E file) aggregation settings
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeConfig {
    /// Columns containing any of these (case-insensitive) are skipped
    pub excluded_column_keywords: Vec<String>,
}

impl Default for EmployeeConfig {
    fn default() -> Self {
        Self {
            excluded_column_keywords: vec![
                "total".to_string(),
                "summary".to_string(),
                "all employees".to_string(),
            ],
        }
    }
}

impl EmployeeConfig {
    pub fn is_excluded(&self, column: &str) -> bool {
        let lower = column.to_lowercase();
        lower.trim().is_empty()
            || self
                .excluded_column_keywords
                .iter()
                .any(|k| lower.contains(&k.to_lowercase()))
    }
}

/// A known department and how O-file rows map to it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepartmentConfig {
    pub name: String,
    /// Exact line-item names carrying this department's revenue
    #[serde(default)]
    pub revenue_items: Vec<String>,
    /// Substrings of expense line items belonging to this department
    #[serde(default)]
    pub expense_keywords: Vec<String>,
}

impl DepartmentConfig {
    pub fn new(name: &str, revenue_items: &[&str], expense_keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            revenue_items: revenue_items.iter().map(|s| s.to_string()).collect(),
            expense_keywords: expense_keywords.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Business (O file) aggregation settings
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessConfig {
    pub departments: Vec<DepartmentConfig>,
    pub materiality_threshold: f64,
    /// Share of revenue assumed as expenses when none were matched
    pub estimated_expense_ratio: f64,
    pub operating_expenses_label: String,
    pub prefix_len: usize,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            departments: vec![
                DepartmentConfig::new(
                    "Medical",
                    &["Medical Revenue", "Medical Services Revenue"],
                    &["medical supplies"],
                ),
                DepartmentConfig::new(
                    "Dental",
                    &["Dental Revenue", "Dental Services Revenue"],
                    &["dental supplies", "dental lab"],
                ),
                DepartmentConfig::new("Hygiene", &["Hygiene Revenue"], &["hygienist"]),
                DepartmentConfig::new(
                    "Pharmacy",
                    &["Pharmacy Revenue", "Pharmacy Sales"],
                    &["drug", "medication"],
                ),
                DepartmentConfig::new(
                    "Laboratory",
                    &["Lab Revenue", "Laboratory Revenue"],
                    &["reference lab", "lab supplies"],
                ),
            ],
            materiality_threshold: 1000.0,
            estimated_expense_ratio: 0.70,
            operating_expenses_label: "Operating Expenses".to_string(),
            prefix_len: 4,
        }
    }
}

/// Everything the aggregator needs besides the statements themselves
#[derive(Debug, Clone, PartialEq)]
pub struct RollupConfig {
    pub classifier_rules: Vec<ClassifierRule>,
    pub employee: EmployeeConfig,
    pub business: BusinessConfig,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            classifier_rules: default_rules(),
            employee: EmployeeConfig::default(),
            business: BusinessConfig::default(),
        }
    }
}

impl RollupConfig {
    /// Load with override resolution (explicit path, data dir, embedded)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_config(path)
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Compile the configured classifier rules
    pub fn classifier(&self) -> Result<Classifier> {
        Classifier::new(self.classifier_rules.clone())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("pulse").join("config").join("rollup.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<RollupConfig> {
    if let Some(path) = override_path.filter(|p| !p.exists()) {
        warn!("Config file {} not found, using defaults", path.display());
    }

    let candidate = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .filter(|p| p.exists());

    let content = match candidate {
        Some(path) => {
            debug!("Loading rollup config from {}", path.display());
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        None => {
            debug!("Using embedded rollup config");
            DEFAULT_CONFIG.to_string()
        }
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    classifier: Option<RawClassifier>,
    employee: Option<RawEmployee>,
    business: Option<RawBusiness>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    rules: Option<Vec<ClassifierRule>>,
}

#[derive(Debug, Deserialize)]
struct RawEmployee {
    excluded_column_keywords: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawBusiness {
    departments: Option<Vec<DepartmentConfig>>,
    materiality_threshold: Option<f64>,
    estimated_expense_ratio: Option<f64>,
    operating_expenses_label: Option<String>,
    prefix_len: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<RollupConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = RollupConfig::default();

    if let Some(rules) = raw.classifier.and_then(|c| c.rules) {
        config.classifier_rules = rules;
    }

    if let Some(keywords) = raw.employee.and_then(|e| e.excluded_column_keywords) {
        config.employee.excluded_column_keywords = keywords;
    }

    if let Some(business) = raw.business {
        if let Some(departments) = business.departments {
            config.business.departments = departments;
        }
        if let Some(threshold) = business.materiality_threshold {
            config.business.materiality_threshold = threshold;
        }
        if let Some(ratio) = business.estimated_expense_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::Config(format!(
                    "estimated_expense_ratio must be between 0 and 1, got {}",
                    ratio
                )));
            }
            config.business.estimated_expense_ratio = ratio;
        }
        if let Some(label) = business.operating_expenses_label {
            config.business.operating_expenses_label = label;
        }
        if let Some(len) = business.prefix_len {
            config.business.prefix_len = len;
        }
    }

    // Surface bad regex rules at load time rather than on first use
    config.classifier()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MatchKind;
    use crate::models::Classification;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, RollupConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = RollupConfig::from_toml(
            r#"
            [business]
            estimated_expense_ratio = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.business.estimated_expense_ratio, 0.5);
        assert_eq!(config.business.materiality_threshold, 1000.0);
        assert_eq!(config.classifier_rules, default_rules());
        assert_eq!(config.business.departments.len(), 5);
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(RollupConfig::from_toml("").unwrap(), RollupConfig::default());
    }

    #[test]
    fn test_rules_override() {
        let config = RollupConfig::from_toml(
            r#"
            [[classifier.rules]]
            pattern = "^Collections"
            match = "regex"
            class = "revenue"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier_rules.len(), 1);
        assert_eq!(config.classifier_rules[0].kind, MatchKind::Regex);
        let classifier = config.classifier().unwrap();
        assert_eq!(
            classifier.classify_name("Collections - Insurance"),
            Classification::Revenue
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RollupConfig::from_toml("[business]\nestimated_expense_ratio = 1.5").is_err());
        assert!(RollupConfig::from_toml("not = [valid").is_err());
        assert!(RollupConfig::from_toml(
            "[[classifier.rules]]\npattern = \"(\"\nmatch = \"regex\"\nclass = \"revenue\""
        )
        .is_err());
    }

    #[test]
    fn test_departments_override() {
        let config = RollupConfig::from_toml(
            r#"
            [[business.departments]]
            name = "Optometry"
            revenue_items = ["Optical Revenue"]
            "#,
        )
        .unwrap();
        assert_eq!(config.business.departments.len(), 1);
        assert_eq!(config.business.departments[0].name, "Optometry");
        assert!(config.business.departments[0].expense_keywords.is_empty());
    }

    #[test]
    fn test_employee_column_exclusion() {
        let employee = EmployeeConfig::default();
        assert!(employee.is_excluded("All Employees"));
        assert!(employee.is_excluded("Practice Total"));
        assert!(employee.is_excluded("Summary"));
        assert!(employee.is_excluded(""));
        assert!(!employee.is_excluded("Dr. Patel"));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollup.toml");
        fs::write(&path, "[business]\nmateriality_threshold = 250.0\n").unwrap();
        let config = RollupConfig::load(Some(&path)).unwrap();
        assert_eq!(config.business.materiality_threshold, 250.0);
    }

    #[test]
    fn test_missing_explicit_path_uses_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let config = RollupConfig::load(Some(&dir.path().join("missing.toml"))).unwrap();
        assert_eq!(config, RollupConfig::default());
    }
}
