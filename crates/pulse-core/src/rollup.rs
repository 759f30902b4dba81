//! Per-entity roll-ups across months
//!
//! Employee roll-ups read one column per provider out of each E statement.
//! Business roll-ups read O statements row by row: department revenue comes
//! from known line items (or a keyword scan when none are present), and
//! expense rows are attributed to departments by keyword and name prefix.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::classify::{Classifier, Metric};
use crate::config::{DepartmentConfig, RollupConfig};
use crate::error::Result;
use crate::models::{
    walk, Classification, EntityRollup, FileKind, LineItemNode, MonthStatements, Period,
    Statement,
};

/// Computes roll-ups under one configuration
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: RollupConfig,
    classifier: Classifier,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            config: RollupConfig::default(),
            classifier: Classifier::default(),
        }
    }
}

impl Aggregator {
    pub fn new(config: RollupConfig) -> Result<Self> {
        let classifier = config.classifier()?;
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Roll up every month in `months`, sorted by revenue (highest first)
    pub fn aggregate(
        &self,
        months: &BTreeMap<Period, MonthStatements>,
        kind: FileKind,
    ) -> Vec<EntityRollup> {
        let statements: Vec<&Statement> = months.values().filter_map(|m| m.get(kind)).collect();
        let mut rollups = match kind {
            FileKind::Employee => self.employee_rollup(&statements),
            FileKind::Business => self.business_rollup(&statements),
        };
        sort_by_revenue(&mut rollups);
        rollups
    }

    /// One record per provider column, empty providers dropped
    pub fn employee_rollup(&self, statements: &[&Statement]) -> Vec<EntityRollup> {
        let mut by_name: Vec<EntityRollup> = Vec::new();

        for statement in statements {
            for column in &statement.columns {
                if self.config.employee.is_excluded(column) {
                    continue;
                }
                let revenue = self
                    .classifier
                    .metric_value(&statement.roots, Metric::Revenue, column)
                    .unwrap_or(0.0);
                let expenses = self
                    .classifier
                    .metric_value(&statement.roots, Metric::Expenses, column)
                    .unwrap_or(0.0);
                let net = self
                    .classifier
                    .metric_value(&statement.roots, Metric::NetIncome, column)
                    .unwrap_or(revenue - expenses);

                let entry = entry_for(&mut by_name, column);
                entry.revenue += revenue;
                entry.expenses += expenses;
                entry.net += net;
            }
        }

        by_name.retain(|r| !r.is_empty());
        by_name
    }

    /// One record per department, plus the operating-expenses bucket
    pub fn business_rollup(&self, statements: &[&Statement]) -> Vec<EntityRollup> {
        let business = &self.config.business;
        let mut departments: Vec<EntityRollup> = Vec::new();
        let mut matched: BTreeSet<String> = BTreeSet::new();

        // Every month's revenue first, so expense matching sees the full
        // department list regardless of month order
        for statement in statements {
            self.add_department_revenue(&statement.roots, &mut departments);
        }

        for statement in statements {
            for node in self
                .classifier
                .class_parts(&statement.roots, Classification::Expense)
            {
                let amount = node.total;
                let target = match_department(&node.name, &business.departments, business.prefix_len)
                    .map(|d| d.name.clone())
                    .or_else(|| {
                        match_department_name(&node.name, &departments, business.prefix_len)
                    });

                match target {
                    Some(name) => {
                        entry_for(&mut departments, &name).expenses += amount;
                        matched.insert(name);
                    }
                    None if amount.abs() > business.materiality_threshold => {
                        entry_for(&mut departments, &business.operating_expenses_label).expenses +=
                            amount;
                    }
                    None => {
                        debug!(
                            "Dropping immaterial unmatched expense {} ({:.2})",
                            node.name, amount
                        );
                    }
                }
            }
        }

        for dept in &mut departments {
            if dept.revenue > 0.0 && !matched.contains(&dept.name) {
                dept.expenses = dept.revenue * business.estimated_expense_ratio;
                dept.estimated = true;
                debug!(
                    "Estimated expenses for {} at {:.0}% of revenue",
                    dept.name,
                    business.estimated_expense_ratio * 100.0
                );
            }
            dept.net = dept.revenue - dept.expenses;
        }

        departments
    }

    /// Credit one month's department revenue
    ///
    /// Known department line items win; only a month with none of them
    /// falls back to treating each counted revenue row as its own department.
    fn add_department_revenue(&self, roots: &[LineItemNode], departments: &mut Vec<EntityRollup>) {
        let business = &self.config.business;
        let mut matched_any = false;

        for dept in &business.departments {
            let known = walk(roots).find(|node| {
                dept.revenue_items
                    .iter()
                    .any(|item| item.trim().eq_ignore_ascii_case(node.name.trim()))
            });
            if let Some(node) = known {
                entry_for(departments, &dept.name).revenue += node.total;
                matched_any = true;
            }
        }

        if matched_any {
            return;
        }

        for node in self.classifier.class_parts(roots, Classification::Revenue) {
            entry_for(departments, &department_label(&node.name)).revenue += node.total;
        }
    }
}

/// Roll up with the built-in configuration
pub fn aggregate(months: &BTreeMap<Period, MonthStatements>, kind: FileKind) -> Vec<EntityRollup> {
    Aggregator::default().aggregate(months, kind)
}

pub fn sort_by_revenue(rollups: &mut [EntityRollup]) {
    rollups.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
}

fn entry_for<'a>(records: &'a mut Vec<EntityRollup>, name: &str) -> &'a mut EntityRollup {
    let index = match records.iter().position(|r| r.name == name) {
        Some(index) => index,
        None => {
            records.push(EntityRollup::new(name));
            records.len() - 1
        }
    };
    &mut records[index]
}

/// Catalogue department whose expense keywords appear in `line_item`, or
/// whose name prefix starts one of its words
fn match_department<'a>(
    line_item: &str,
    catalogue: &'a [DepartmentConfig],
    prefix_len: usize,
) -> Option<&'a DepartmentConfig> {
    let lower = line_item.to_lowercase();
    catalogue
        .iter()
        .find(|d| {
            d.expense_keywords
                .iter()
                .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
        })
        .or_else(|| {
            catalogue
                .iter()
                .find(|d| shares_prefix(&lower, &d.name, prefix_len))
        })
}

/// Department discovered from revenue rows whose name prefix appears in
/// `line_item`
fn match_department_name(
    line_item: &str,
    departments: &[EntityRollup],
    prefix_len: usize,
) -> Option<String> {
    let lower = line_item.to_lowercase();
    departments
        .iter()
        .find(|d| shares_prefix(&lower, &d.name, prefix_len))
        .map(|d| d.name.clone())
}

fn shares_prefix(lower_line_item: &str, department: &str, prefix_len: usize) -> bool {
    if prefix_len == 0 {
        return false;
    }
    let prefix: String = department.to_lowercase().chars().take(prefix_len).collect();
    if prefix.chars().count() < prefix_len {
        return false;
    }
    lower_line_item
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.starts_with(&prefix))
}

/// "Optical Revenue" → "Optical"; names that are only the keyword stay as-is
fn department_label(name: &str) -> String {
    let trimmed = name.trim();
    let lower = trimmed.to_lowercase();
    for suffix in [" revenue", " income", " sales"] {
        if lower.ends_with(suffix) {
            let label = trimmed[..trimmed.len() - suffix.len()].trim();
            if !label.is_empty() {
                return label.to_string();
            }
        }
    }
    trimmed.to_string()
}
