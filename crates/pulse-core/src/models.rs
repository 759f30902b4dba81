//! Domain models for Pulse

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reserved column holding the indented line-item label
pub const LINE_ITEM_COLUMN: &str = "Line Item";

/// Unlabeled column some exports use for a precomputed row total
pub const SUMMARY_COLUMN: &str = "";

/// Labeled summary column of employee exports
pub const EMPLOYEE_SUMMARY_COLUMN: &str = "All Employees";

/// Pseudo-column name resolving to a node's summary value
pub const TOTAL_COLUMN: &str = "Total";

/// A single raw CSV cell, typed at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One row of a statement export
///
/// `line_item` keeps its leading whitespace; the indentation is the only
/// hierarchy signal the exports carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCsvRow {
    pub line_item: String,
    pub cells: BTreeMap<String, CellValue>,
}

impl RawCsvRow {
    pub fn new(line_item: impl Into<String>) -> Self {
        Self {
            line_item: line_item.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Builder-style cell insertion
    pub fn cell(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

/// A node of the reconstructed statement tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemNode {
    /// Synthetic identifier, unique within one build
    pub id: String,
    /// Label with the indentation removed
    pub name: String,
    pub depth: usize,
    /// Amount per requested entity column (always populated, default 0)
    pub values: BTreeMap<String, f64>,
    /// Summary column value, or the sum of `values` when the row has none
    pub total: f64,
    pub is_total: bool,
    pub children: Vec<LineItemNode>,
}

impl LineItemNode {
    /// Amount for a column; `TOTAL_COLUMN` resolves to the summary value
    pub fn value(&self, column: &str) -> f64 {
        if column == TOTAL_COLUMN {
            return self.total;
        }
        self.values.get(column).copied().unwrap_or(0.0)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order iterator over this node and all of its descendants
    pub fn iter(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including self
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

/// Pre-order iterator over a forest in source row order
pub struct Descendants<'a> {
    stack: Vec<&'a LineItemNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a LineItemNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Walk a whole forest in row order
pub fn walk(nodes: &[LineItemNode]) -> Descendants<'_> {
    Descendants {
        stack: nodes.iter().rev().collect(),
    }
}

/// Semantic class of a line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Revenue,
    Expense,
    NetIncome,
    Total,
    Unclassified,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::NetIncome => "net-income",
            Self::Total => "total",
            Self::Unclassified => "unclassified",
        }
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            "net-income" | "net_income" => Ok(Self::NetIncome),
            "total" => Ok(Self::Total),
            "unclassified" => Ok(Self::Unclassified),
            _ => Err(format!("Unknown classification: {}", s)),
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of monthly export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// "E" file: one column per employee/provider
    Employee,
    /// "O" file: one column per business unit/department
    Business,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Business => "business",
        }
    }

    /// Single-letter code used in upload file names
    pub fn code(&self) -> char {
        match self {
            Self::Employee => 'E',
            Self::Business => 'O',
        }
    }
}

impl std::str::FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "e" | "employee" | "employees" => Ok(Self::Employee),
            "o" | "business" | "department" | "departments" => Ok(Self::Business),
            _ => Err(format!("Unknown file kind: {}", s)),
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reporting month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn first_day(&self) -> NaiveDate {
        // Construction guarantees a valid month
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Short display label, e.g. "Jan 2024"
    pub fn label(&self) -> String {
        self.first_day().format("%b %Y").to_string()
    }
}

impl From<NaiveDate> for Period {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Period::from)
            .map_err(|_| format!("Invalid period (use YYYY-MM): {}", s))
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// A parsed statement export: its entity columns and line-item forest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Entity columns in header order
    pub columns: Vec<String>,
    pub roots: Vec<LineItemNode>,
    /// SHA-256 of the raw upload, when read from a file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Statement {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of line items in the forest
    pub fn line_count(&self) -> usize {
        walk(&self.roots).count()
    }
}

/// The E and O statements uploaded for one month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthStatements {
    pub employee: Option<Statement>,
    pub business: Option<Statement>,
}

impl MonthStatements {
    pub fn get(&self, kind: FileKind) -> Option<&Statement> {
        match kind {
            FileKind::Employee => self.employee.as_ref(),
            FileKind::Business => self.business.as_ref(),
        }
    }

    pub fn insert(&mut self, kind: FileKind, statement: Statement) {
        match kind {
            FileKind::Employee => self.employee = Some(statement),
            FileKind::Business => self.business = Some(statement),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.employee.as_ref().map_or(true, Statement::is_empty)
            && self.business.as_ref().map_or(true, Statement::is_empty)
    }
}

/// Per-entity roll-up across the requested months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRollup {
    pub name: String,
    pub revenue: f64,
    pub expenses: f64,
    pub net: f64,
    /// Expenses are the configured share of revenue, not matched rows
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub estimated: bool,
}

impl EntityRollup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revenue: 0.0,
            expenses: 0.0,
            net: 0.0,
            estimated: false,
        }
    }

    /// Net as a percentage of revenue (0 when there is no revenue)
    pub fn margin(&self) -> f64 {
        percentage(self.net, self.revenue)
    }

    /// Net as a percentage of expenses (0 when there are no expenses)
    pub fn roi(&self) -> f64 {
        percentage(self.net, self.expenses)
    }

    pub fn is_empty(&self) -> bool {
        self.revenue == 0.0 && self.expenses == 0.0 && self.net == 0.0
    }
}

/// Headline figures for summary cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
}

impl Kpis {
    pub fn margin(&self) -> f64 {
        percentage(self.net_income, self.revenue)
    }
}

impl std::ops::AddAssign for Kpis {
    fn add_assign(&mut self, other: Self) {
        self.revenue += other.revenue;
        self.expenses += other.expenses;
        self.net_income += other.net_income;
    }
}

pub(crate) fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
