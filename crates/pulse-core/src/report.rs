//! Dashboard figures derived from loaded months
//!
//! Everything here is a pure function of parsed statements and roll-ups, so
//! the CLI and any future front end render the same numbers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::Classifier;
use crate::models::{percentage, EntityRollup, FileKind, Kpis, MonthStatements, Period, Statement};
use crate::rollup::Aggregator;

/// Headline figures for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: Period,
    /// Display label, e.g. "Jan 2024"
    pub label: String,
    /// Which export the figures came from
    pub source: FileKind,
    pub revenue: f64,
    pub expenses: f64,
    pub net_income: f64,
    /// Net income as a percentage of revenue
    pub margin: f64,
}

impl TrendPoint {
    pub fn kpis(&self) -> Kpis {
        Kpis {
            revenue: self.revenue,
            expenses: self.expenses,
            net_income: self.net_income,
        }
    }
}

/// One entity's slice of total revenue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSlice {
    pub name: String,
    pub revenue: f64,
    /// Percentage of the combined positive revenue
    pub share: f64,
}

/// Ranking metric for performer lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    Revenue,
    Net,
    Margin,
    Roi,
}

impl RankBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Net => "net",
            Self::Margin => "margin",
            Self::Roi => "roi",
        }
    }

    fn score(&self, rollup: &EntityRollup) -> f64 {
        match self {
            Self::Revenue => rollup.revenue,
            Self::Net => rollup.net,
            Self::Margin => rollup.margin(),
            Self::Roi => rollup.roi(),
        }
    }

    /// Ratios are meaningless without a denominator
    fn applies_to(&self, rollup: &EntityRollup) -> bool {
        match self {
            Self::Revenue | Self::Net => true,
            Self::Margin => rollup.revenue != 0.0,
            Self::Roi => rollup.expenses != 0.0,
        }
    }
}

impl std::str::FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "revenue" => Ok(Self::Revenue),
            "net" | "net-income" | "profit" => Ok(Self::Net),
            "margin" => Ok(Self::Margin),
            "roi" => Ok(Self::Roi),
            _ => Err(format!("Unknown ranking metric: {}", s)),
        }
    }
}

impl std::fmt::Display for RankBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-month KPIs, oldest first
///
/// Practice-wide O statements are preferred; a month with only an E upload
/// falls back to it. Months with neither are skipped.
pub fn margin_trend(
    months: &BTreeMap<Period, MonthStatements>,
    classifier: &Classifier,
) -> Vec<TrendPoint> {
    months
        .iter()
        .filter_map(|(period, month)| {
            let (source, statement) = headline_statement(month)?;
            let kpis = classifier.kpis(&statement.roots);
            Some(TrendPoint {
                period: *period,
                label: period.label(),
                source,
                revenue: kpis.revenue,
                expenses: kpis.expenses,
                net_income: kpis.net_income,
                margin: kpis.margin(),
            })
        })
        .collect()
}

/// Revenue share per entity, largest first
///
/// Entities without positive revenue (such as the operating-expenses bucket)
/// are left out of the mix.
pub fn revenue_mix(rollups: &[EntityRollup]) -> Vec<MixSlice> {
    let earning: Vec<&EntityRollup> = rollups.iter().filter(|r| r.revenue > 0.0).collect();
    let total: f64 = earning.iter().map(|r| r.revenue).sum();

    let mut mix: Vec<MixSlice> = earning
        .into_iter()
        .map(|r| MixSlice {
            name: r.name.clone(),
            revenue: r.revenue,
            share: percentage(r.revenue, total),
        })
        .collect();
    mix.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    mix
}

/// Best `limit` entities by `by`, highest first (ties keep input order)
pub fn rank_performers(rollups: &[EntityRollup], by: RankBy, limit: usize) -> Vec<EntityRollup> {
    let mut ranked: Vec<EntityRollup> = rollups
        .iter()
        .filter(|r| by.applies_to(r))
        .cloned()
        .collect();
    ranked.sort_by(|a, b| by.score(b).total_cmp(&by.score(a)));
    ranked.truncate(limit);
    ranked
}

/// Everything the dashboard view shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub periods: Vec<Period>,
    /// Sum of the monthly headline figures
    pub totals: Kpis,
    pub margin: f64,
    pub trend: Vec<TrendPoint>,
    pub employees: Vec<EntityRollup>,
    pub departments: Vec<EntityRollup>,
    pub department_mix: Vec<MixSlice>,
    pub top_providers: Vec<EntityRollup>,
    pub top_departments: Vec<EntityRollup>,
}

impl Dashboard {
    /// Assemble the dashboard; `None` means there is no data to show
    pub fn build(
        months: &BTreeMap<Period, MonthStatements>,
        aggregator: &Aggregator,
        limit: usize,
    ) -> Option<Self> {
        let periods: Vec<Period> = months
            .iter()
            .filter(|(_, month)| !month.is_empty())
            .map(|(period, _)| *period)
            .collect();
        if periods.is_empty() {
            debug!("No statements loaded, nothing to report");
            return None;
        }

        let trend = margin_trend(months, aggregator.classifier());
        let mut totals = Kpis::default();
        for point in &trend {
            totals += point.kpis();
        }

        let employees = aggregator.aggregate(months, FileKind::Employee);
        let departments = aggregator.aggregate(months, FileKind::Business);

        Some(Self {
            periods,
            margin: totals.margin(),
            totals,
            trend,
            department_mix: revenue_mix(&departments),
            top_providers: rank_performers(&employees, RankBy::Net, limit),
            top_departments: rank_performers(&departments, RankBy::Margin, limit),
            employees,
            departments,
        })
    }
}

fn headline_statement(month: &MonthStatements) -> Option<(FileKind, &Statement)> {
    [FileKind::Business, FileKind::Employee]
        .into_iter()
        .find_map(|kind| {
            month
                .get(kind)
                .filter(|s| !s.is_empty())
                .map(|s| (kind, s))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;
    use crate::models::RawCsvRow;

    fn rollup(name: &str, revenue: f64, expenses: f64) -> EntityRollup {
        EntityRollup {
            name: name.to_string(),
            revenue,
            expenses,
            net: revenue - expenses,
            estimated: false,
        }
    }

    fn statement(rows: &[(&str, &str)]) -> Statement {
        let columns = vec!["Clinic".to_string()];
        let rows: Vec<RawCsvRow> = rows
            .iter()
            .map(|(label, value)| RawCsvRow::new(*label).cell("Clinic", *value))
            .collect();
        HierarchyBuilder::new().build_statement(&rows, &columns)
    }

    fn month(kind: FileKind, statement: Statement) -> MonthStatements {
        let mut month = MonthStatements::default();
        month.insert(kind, statement);
        month
    }

    #[test]
    fn test_trend_prefers_business_statement() {
        let mut m = month(
            FileKind::Employee,
            statement(&[("Total Revenue", "100"), ("Total Expenses", "60")]),
        );
        m.insert(
            FileKind::Business,
            statement(&[("Total Income", "400"), ("Total Expenses", "300")]),
        );
        let months = BTreeMap::from([(Period::new(2024, 1).unwrap(), m)]);

        let trend = margin_trend(&months, &Classifier::default());
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].source, FileKind::Business);
        assert_eq!(trend[0].revenue, 400.0);
        assert_eq!(trend[0].net_income, 100.0);
        assert_eq!(trend[0].margin, 25.0);
        assert_eq!(trend[0].label, "Jan 2024");
    }

    #[test]
    fn test_trend_falls_back_to_employee_statement() {
        let months = BTreeMap::from([
            (
                Period::new(2024, 2).unwrap(),
                month(
                    FileKind::Employee,
                    statement(&[("Total Revenue", "200"), ("Net Income", "50")]),
                ),
            ),
            (Period::new(2024, 1).unwrap(), MonthStatements::default()),
        ]);

        let trend = margin_trend(&months, &Classifier::default());
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].period, Period::new(2024, 2).unwrap());
        assert_eq!(trend[0].source, FileKind::Employee);
        assert_eq!(trend[0].net_income, 50.0);
    }

    #[test]
    fn test_revenue_mix() {
        let mix = revenue_mix(&[
            rollup("Dental", 250.0, 100.0),
            rollup("Operating Expenses", 0.0, 90.0),
            rollup("Medical", 750.0, 300.0),
        ]);
        assert_eq!(mix.len(), 2);
        assert_eq!(mix[0].name, "Medical");
        assert_eq!(mix[0].share, 75.0);
        assert_eq!(mix[1].share, 25.0);
    }

    #[test]
    fn test_revenue_mix_empty() {
        assert!(revenue_mix(&[]).is_empty());
        assert!(revenue_mix(&[rollup("Opex", 0.0, 10.0)]).is_empty());
    }

    #[test]
    fn test_rank_performers() {
        let rollups = vec![
            rollup("A", 100.0, 90.0),
            rollup("B", 300.0, 240.0),
            rollup("C", 50.0, 10.0),
            rollup("Opex", 0.0, 500.0),
        ];

        let by_revenue = rank_performers(&rollups, RankBy::Revenue, 2);
        let names: Vec<&str> = by_revenue.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);

        let by_net = rank_performers(&rollups, RankBy::Net, 10);
        let names: Vec<&str> = by_net.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A", "Opex"]);

        let by_margin = rank_performers(&rollups, RankBy::Margin, 10);
        let names: Vec<&str> = by_margin.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);

        assert!(rank_performers(&rollups, RankBy::Roi, 0).is_empty());
    }

    #[test]
    fn test_rank_by_parse() {
        assert_eq!("ROI".parse::<RankBy>().unwrap(), RankBy::Roi);
        assert_eq!("net-income".parse::<RankBy>().unwrap(), RankBy::Net);
        assert!("volume".parse::<RankBy>().is_err());
        assert_eq!(RankBy::Margin.to_string(), "margin");
    }

    #[test]
    fn test_dashboard_none_without_data() {
        let aggregator = Aggregator::default();
        assert!(Dashboard::build(&BTreeMap::new(), &aggregator, 5).is_none());

        let empty = BTreeMap::from([(Period::new(2024, 1).unwrap(), MonthStatements::default())]);
        assert!(Dashboard::build(&empty, &aggregator, 5).is_none());
    }

    #[test]
    fn test_dashboard_totals_sum_months() {
        let months = BTreeMap::from([
            (
                Period::new(2024, 1).unwrap(),
                month(
                    FileKind::Business,
                    statement(&[("Total Income", "100"), ("Total Expenses", "40")]),
                ),
            ),
            (
                Period::new(2024, 2).unwrap(),
                month(
                    FileKind::Business,
                    statement(&[("Total Income", "300"), ("Total Expenses", "160")]),
                ),
            ),
        ]);

        let dashboard = Dashboard::build(&months, &Aggregator::default(), 3).unwrap();
        assert_eq!(dashboard.periods.len(), 2);
        assert_eq!(dashboard.totals.revenue, 400.0);
        assert_eq!(dashboard.totals.expenses, 200.0);
        assert_eq!(dashboard.totals.net_income, 200.0);
        assert_eq!(dashboard.margin, 50.0);
        assert!(dashboard.employees.is_empty());
    }
}
