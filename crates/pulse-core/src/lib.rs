//! Pulse Core Library
//!
//! Shared functionality for the Pulse practice financial-reporting tool:
//! - CSV import for monthly E (employee) and O (business) exports
//! - Financial value parsing (currency, parentheses, percentages)
//! - Statement tree reconstruction from indented line items
//! - Rule-based line-item classification and KPI extraction
//! - Per-provider and per-department roll-ups
//! - Data sources (upload directories, bundled demo data)
//! - Dashboard reports: margin trend, revenue mix, performer rankings

pub mod classify;
pub mod config;
pub mod depth;
pub mod error;
pub mod hierarchy;
pub mod import;
pub mod models;
pub mod report;
pub mod rollup;
pub mod source;
pub mod value;

pub use classify::{extract_by_keyword, Classifier, ClassifierRule, MatchKind, Metric};
pub use config::{BusinessConfig, DepartmentConfig, EmployeeConfig, RollupConfig};
pub use depth::{get_depth, DepthPolicy, SpaceIndent, TabIndent};
pub use error::{Error, Result};
pub use hierarchy::{build_hierarchy, HierarchyBuilder};
pub use import::{detect_upload, parse_statement_csv, parse_statement_file};
pub use models::{
    CellValue, Classification, EntityRollup, FileKind, Kpis, LineItemNode, MonthStatements,
    Period, RawCsvRow, Statement,
};
pub use report::{margin_trend, rank_performers, revenue_mix, Dashboard, MixSlice, RankBy, TrendPoint};
pub use rollup::Aggregator;
pub use source::{load_all, load_selected, DataSource, DemoSource, UploadDirSource};
pub use value::{parse_financial_str, parse_financial_value};
