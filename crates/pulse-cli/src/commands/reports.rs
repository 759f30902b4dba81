//! Multi-month command implementations (rollup, trend, dashboard, months)

use anyhow::{anyhow, Context, Result};
use pulse_core::{
    load_all, load_selected, margin_trend, Aggregator, Dashboard, DataSource, EntityRollup,
    FileKind, TrendPoint,
};

use super::{money, parse_months, print_json, truncate};

pub fn cmd_rollup(
    source: &dyn DataSource,
    aggregator: &Aggregator,
    kind: &str,
    months: &[String],
    json: bool,
) -> Result<()> {
    let kind: FileKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let periods = parse_months(months)?;
    let loaded = load_selected(source, &periods).context("Failed to load statements")?;
    let rollups = aggregator.aggregate(&loaded, kind);

    if json {
        return print_json(&rollups);
    }

    let title = match kind {
        FileKind::Employee => "Provider",
        FileKind::Business => "Department",
    };
    println!();
    println!("📊 {} Roll-up ({} month(s) from {})", title, loaded.len(), source.name());
    println!("   ─────────────────────────────────────────────────────────────");

    if rollups.is_empty() {
        println!("   No data available.");
        return Ok(());
    }

    print_rollup_table(title, &rollups);
    if rollups.iter().any(|r| r.estimated) {
        println!();
        println!(
            "   * expenses estimated at {:.0}% of revenue",
            aggregator.config().business.estimated_expense_ratio * 100.0
        );
    }

    Ok(())
}

pub fn cmd_trend(source: &dyn DataSource, aggregator: &Aggregator, json: bool) -> Result<()> {
    let loaded = load_all(source).context("Failed to load statements")?;
    let trend = margin_trend(&loaded, aggregator.classifier());

    if json {
        return print_json(&trend);
    }

    println!();
    println!("📈 Margin Trend ({})", source.name());
    println!("   ─────────────────────────────────────────────────────────────");

    if trend.is_empty() {
        println!("   No data available.");
        return Ok(());
    }

    print_trend_table(&trend);
    Ok(())
}

pub fn cmd_dashboard(
    source: &dyn DataSource,
    aggregator: &Aggregator,
    limit: usize,
    json: bool,
) -> Result<()> {
    let loaded = load_all(source).context("Failed to load statements")?;
    let dashboard = Dashboard::build(&loaded, aggregator, limit);

    if json {
        return print_json(&dashboard);
    }

    println!();
    println!("📊 Pulse Dashboard ({})", source.name());
    println!("   ─────────────────────────────────────────────────────────────");

    let Some(dashboard) = dashboard else {
        println!("   No data available.");
        return Ok(());
    };

    let first = dashboard.periods.first().map(|p| p.label()).unwrap_or_default();
    let last = dashboard.periods.last().map(|p| p.label()).unwrap_or_default();
    println!("   Period: {} to {} ({} months)", first, last, dashboard.periods.len());
    println!();
    println!("   💰 Revenue:     {:>16}", money(dashboard.totals.revenue));
    println!("   💸 Expenses:    {:>16}", money(dashboard.totals.expenses));
    println!("   📈 Net Income:  {:>16}", money(dashboard.totals.net_income));
    println!("   📐 Margin:      {:>15.1}%", dashboard.margin);

    if !dashboard.trend.is_empty() {
        println!();
        println!("   Margin Trend");
        print_trend_table(&dashboard.trend);
    }

    if !dashboard.department_mix.is_empty() {
        println!();
        println!("   Revenue Mix");
        for slice in &dashboard.department_mix {
            let bar = "█".repeat((slice.share / 5.0).round() as usize);
            println!(
                "   {:20} {:>5.1}% {}",
                truncate(&slice.name, 20),
                slice.share,
                bar
            );
        }
    }

    if !dashboard.top_providers.is_empty() {
        println!();
        println!("   🏆 Top Providers (by net income)");
        print_rollup_table("Provider", &dashboard.top_providers);
    }

    if !dashboard.top_departments.is_empty() {
        println!();
        println!("   🏆 Top Departments (by margin)");
        print_rollup_table("Department", &dashboard.top_departments);
    }

    Ok(())
}

pub fn cmd_months(source: &dyn DataSource) -> Result<()> {
    let periods = source.periods().context("Failed to list months")?;

    println!();
    println!("📅 Months ({})", source.name());
    println!("   ─────────────────────────────────────────────────────────────");

    if periods.is_empty() {
        println!("   No uploads found.");
        return Ok(());
    }

    for period in periods {
        let kinds = source.kinds(period)?;
        let has = |kind: FileKind| {
            if kinds.contains(&kind) {
                "✓"
            } else {
                "-"
            }
        };
        println!(
            "   {}  {:9}  E {}  O {}",
            period,
            period.label(),
            has(FileKind::Employee),
            has(FileKind::Business)
        );
    }

    Ok(())
}

fn print_rollup_table(title: &str, rollups: &[EntityRollup]) {
    println!(
        "   {:22} │ {:>14} │ {:>14} │ {:>14} │ {:>7}",
        title, "Revenue", "Expenses", "Net", "Margin"
    );
    println!("   ───────────────────────┼────────────────┼────────────────┼────────────────┼────────");
    for r in rollups {
        let marker = if r.estimated { "*" } else { " " };
        println!(
            "   {:22} │ {:>14} │ {:>13}{} │ {:>14} │ {:>6.1}%",
            truncate(&r.name, 22),
            money(r.revenue),
            money(r.expenses),
            marker,
            money(r.net),
            r.margin()
        );
    }
}

fn print_trend_table(trend: &[TrendPoint]) {
    println!(
        "   {:9} │ {:>14} │ {:>14} │ {:>14} │ {:>7}",
        "Month", "Revenue", "Expenses", "Net Income", "Margin"
    );
    println!("   ──────────┼────────────────┼────────────────┼────────────────┼────────");
    for point in trend {
        println!(
            "   {:9} │ {:>14} │ {:>14} │ {:>14} │ {:>6.1}%",
            point.label,
            money(point.revenue),
            money(point.expenses),
            money(point.net_income),
            point.margin
        );
    }
}
