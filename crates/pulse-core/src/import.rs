//! CSV import for monthly statement exports
//!
//! Both E and O exports share one layout: a header row, a "Line Item" column
//! whose leading spaces encode nesting, one column per entity and optionally
//! an unlabeled column with the row total. Cells stay text here; amounts are
//! parsed when the tree is built.

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hierarchy::HierarchyBuilder;
use crate::models::{
    CellValue, FileKind, Period, RawCsvRow, Statement, EMPLOYEE_SUMMARY_COLUMN, LINE_ITEM_COLUMN,
};

/// Header and rows of one export, before tree reconstruction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementRows {
    /// Entity columns in header order (summary column excluded)
    pub columns: Vec<String>,
    pub has_summary_column: bool,
    pub rows: Vec<RawCsvRow>,
}

/// Read headers and rows; records that fail to decode are skipped
pub fn read_rows<R: Read>(reader: R) -> Result<StatementRows> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let line_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(LINE_ITEM_COLUMN))
        .ok_or_else(|| Error::Import(format!("Missing '{}' column", LINE_ITEM_COLUMN)))?;

    let has_summary_column = headers
        .iter()
        .enumerate()
        .any(|(i, h)| i != line_index && h.is_empty());
    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != line_index && !h.is_empty())
        .map(|(_, h)| h.clone())
        .collect();
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].contains(column) {
            return Err(Error::InvalidData(format!("Duplicate column '{}'", column)));
        }
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (index, result) in rdr.records().enumerate() {
        match result {
            Ok(record) => rows.push(record_to_row(&headers, line_index, &record)),
            Err(e) => {
                // Header is line 1, so data starts at line 2
                warn!("Skipping unreadable CSV record {}: {}", index + 2, e);
                skipped += 1;
            }
        }
    }

    debug!(
        "Read {} rows across {} entity columns ({} skipped)",
        rows.len(),
        columns.len(),
        skipped
    );
    Ok(StatementRows {
        columns,
        has_summary_column,
        rows,
    })
}

/// Parse an export straight into a statement tree
///
/// Row totals come from the unlabeled column when present, otherwise from an
/// "All Employees" column, otherwise from summing the entity columns.
pub fn parse_statement_csv<R: Read>(reader: R) -> Result<Statement> {
    let parsed = read_rows(reader)?;
    let builder = HierarchyBuilder::new();
    let builder = if parsed.has_summary_column {
        builder
    } else {
        let labeled = parsed
            .columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(EMPLOYEE_SUMMARY_COLUMN));
        builder.with_summary_column(labeled.map(String::as_str))
    };
    Ok(builder.build_statement(&parsed.rows, &parsed.columns))
}

/// Parse an export file, fingerprinting its raw bytes
pub fn parse_statement_file(path: &Path) -> Result<Statement> {
    let bytes = fs::read(path)?;
    let mut statement = parse_statement_csv(bytes.as_slice())?;
    statement.fingerprint = Some(fingerprint(&bytes));
    debug!(
        "Parsed {} ({} line items)",
        path.display(),
        statement.line_count()
    );
    Ok(statement)
}

/// SHA-256 of an upload, hex encoded
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Recognise the period and kind from an upload file name
///
/// Accepts `2024-01_E.csv`, `2024-01-o.csv`, `202401 E.csv` and the
/// kind-first `E_2024-01.csv`.
pub fn detect_upload(file_name: &str) -> Option<(Period, FileKind)> {
    static PERIOD_FIRST: OnceLock<Option<Regex>> = OnceLock::new();
    static KIND_FIRST: OnceLock<Option<Regex>> = OnceLock::new();

    let period_first = PERIOD_FIRST
        .get_or_init(|| Regex::new(r"(?i)^(\d{4})[-_]?(\d{2})[-_ ]+([EO])\.csv$").ok());
    let kind_first = KIND_FIRST
        .get_or_init(|| Regex::new(r"(?i)^([EO])[-_ ]+(\d{4})[-_]?(\d{2})\.csv$").ok());

    let name = file_name.trim();
    let (year, month, kind) = if let Some(caps) = period_first.as_ref()?.captures(name) {
        (caps[1].to_string(), caps[2].to_string(), caps[3].to_string())
    } else {
        let caps = kind_first.as_ref()?.captures(name)?;
        (caps[2].to_string(), caps[3].to_string(), caps[1].to_string())
    };

    let period = Period::new(year.parse().ok()?, month.parse().ok()?)?;
    let kind = kind.parse().ok()?;
    Some((period, kind))
}

/// Convert a CSV record to a typed row using headers as keys
fn record_to_row(headers: &[String], line_index: usize, record: &StringRecord) -> RawCsvRow {
    let mut row = RawCsvRow::new(record.get(line_index).unwrap_or("").trim_end());
    for (i, header) in headers.iter().enumerate() {
        if i == line_index {
            continue;
        }
        if let Some(value) = record.get(i) {
            row.cells
                .insert(header.clone(), CellValue::Text(value.to_string()));
        }
    }
    row
}
