//! Statement tree reconstruction
//!
//! Rows arrive flat, in export order, with their nesting encoded only by
//! label indentation. A single pass with a stack of open ancestors rebuilds
//! the forest: each row pops every open node at the same or deeper level,
//! attaches to whatever remains on top (or becomes a root), then stays open
//! for the rows that follow.

use std::collections::BTreeMap;

use tracing::debug;

use crate::depth::{DepthPolicy, SpaceIndent};
use crate::models::{CellValue, LineItemNode, RawCsvRow, Statement, SUMMARY_COLUMN};
use crate::value::parse_financial_value;

/// Builds line-item forests from raw rows
#[derive(Debug, Clone)]
pub struct HierarchyBuilder<P = SpaceIndent> {
    policy: P,
    summary_column: Option<String>,
}

impl Default for HierarchyBuilder<SpaceIndent> {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchyBuilder<SpaceIndent> {
    /// Two-spaces-per-level indentation, unlabeled summary column
    pub fn new() -> Self {
        Self {
            policy: SpaceIndent::default(),
            summary_column: Some(SUMMARY_COLUMN.to_string()),
        }
    }
}

impl<P: DepthPolicy> HierarchyBuilder<P> {
    /// Swap the indentation convention
    pub fn with_policy<Q: DepthPolicy>(self, policy: Q) -> HierarchyBuilder<Q> {
        HierarchyBuilder {
            policy,
            summary_column: self.summary_column,
        }
    }

    /// Column whose value is taken as the row total (`None` always sums)
    pub fn with_summary_column(mut self, column: Option<&str>) -> Self {
        self.summary_column = column.map(str::to_string);
        self
    }

    /// Rebuild the forest for `rows`, populating every column in `columns`
    pub fn build(&self, rows: &[RawCsvRow], columns: &[String]) -> Vec<LineItemNode> {
        let mut roots: Vec<LineItemNode> = Vec::new();
        // Open ancestors as (child index within parent, depth)
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut skipped = 0usize;

        for (row_index, row) in rows.iter().enumerate() {
            let Some(node) = self.node_for_row(row_index, row, columns) else {
                skipped += 1;
                continue;
            };
            let depth = node.depth;

            while stack.last().is_some_and(|&(_, open)| open >= depth) {
                stack.pop();
            }

            let siblings = match stack.split_first() {
                None => &mut roots,
                Some((&(root, _), rest)) => {
                    let mut parent = &mut roots[root];
                    for &(index, _) in rest {
                        parent = &mut parent.children[index];
                    }
                    &mut parent.children
                }
            };
            siblings.push(node);
            stack.push((siblings.len() - 1, depth));
        }

        debug!(
            "Built {} root line items from {} rows ({} skipped)",
            roots.len(),
            rows.len(),
            skipped
        );
        roots
    }

    /// Build a statement carrying its column list alongside the forest
    pub fn build_statement(&self, rows: &[RawCsvRow], columns: &[String]) -> Statement {
        Statement {
            columns: columns.to_vec(),
            roots: self.build(rows, columns),
            fingerprint: None,
        }
    }

    fn node_for_row(
        &self,
        row_index: usize,
        row: &RawCsvRow,
        columns: &[String],
    ) -> Option<LineItemNode> {
        let name = row.line_item.trim();
        if name.is_empty() {
            return None;
        }

        let depth = self.policy.depth(&row.line_item);
        let values: BTreeMap<String, f64> = columns
            .iter()
            .map(|column| {
                let amount = row.get(column).map(parse_financial_value).unwrap_or(0.0);
                (column.clone(), amount)
            })
            .collect();

        let summary = self
            .summary_column
            .as_deref()
            .and_then(|column| row.get(column))
            .filter(|cell| !is_blank(cell))
            .map(parse_financial_value);
        let total = summary.unwrap_or_else(|| values.values().sum());

        Some(LineItemNode {
            id: node_id(name, depth, row_index),
            name: name.to_string(),
            depth,
            values,
            total,
            is_total: name.to_lowercase().contains("total"),
            children: Vec::new(),
        })
    }
}

/// Build a forest with the default builder
pub fn build_hierarchy(rows: &[RawCsvRow], columns: &[String]) -> Vec<LineItemNode> {
    HierarchyBuilder::new().build(rows, columns)
}

fn is_blank(cell: &CellValue) -> bool {
    matches!(cell, CellValue::Text(s) if s.trim().is_empty())
}

/// Label slug plus depth plus row position; the row position keeps repeated
/// labels ("Other", "Supplies") under different parents distinct.
fn node_id(name: &str, depth: usize, row_index: usize) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_end_matches('-');
    format!("{}-d{}-r{}", slug, depth, row_index)
}
