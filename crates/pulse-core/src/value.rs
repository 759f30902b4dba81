//! Financial cell value parsing
//!
//! Statement exports format amounts for people, not machines: currency
//! symbols, thousands separators, accounting-style parentheses for negatives
//! and the occasional trailing percent sign. Every cell parses to a finite
//! number; anything unreadable becomes 0.

use crate::models::CellValue;

/// Parse a raw cell into a signed amount
pub fn parse_financial_value(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Number(n) => finite_or_zero(*n),
        CellValue::Text(s) => parse_financial_str(s),
    }
}

/// Parse a formatted amount string
///
/// `"$1,234.56"` → 1234.56, `"(1,234.56)"` → -1234.56, `"12.5%"` → 12.5.
/// The percent sign is only stripped; callers decide what the number means.
pub fn parse_financial_str(s: &str) -> f64 {
    let mut cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    cleaned = cleaned.trim().to_string();

    let negative = cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() >= 2;
    if negative {
        cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
    }

    if let Some(stripped) = cleaned.strip_suffix('%') {
        cleaned = stripped.trim_end().to_string();
    }

    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }

    match cleaned.parse::<f64>() {
        Ok(n) if negative => finite_or_zero(-n),
        Ok(n) => finite_or_zero(n),
        Err(_) => 0.0,
    }
}

fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() {
        n
    } else {
        0.0
    }
}
