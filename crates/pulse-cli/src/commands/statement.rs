//! Single-export commands (tree, kpis)

use std::path::Path;

use anyhow::{Context, Result};
use pulse_core::{parse_statement_file, Aggregator, LineItemNode, Statement};

use super::{money, print_json, truncate};

fn read_statement(file: &Path) -> Result<Statement> {
    parse_statement_file(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub fn cmd_tree(file: &Path, json: bool) -> Result<()> {
    let statement = read_statement(file)?;

    if json {
        return print_json(&statement.roots);
    }

    println!();
    println!("📄 {}", file.display());
    println!(
        "   {} line items, {} columns: {}",
        statement.line_count(),
        statement.columns.len(),
        statement.columns.join(", ")
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if statement.is_empty() {
        println!("   No line items found.");
        return Ok(());
    }

    println!("   {:40} │ {:>14}", "Line Item", "Total");
    println!("   ─────────────────────────────────────────┼───────────────");

    fn print_node(node: &LineItemNode, indent: usize) {
        let prefix = "  ".repeat(indent);
        let label = format!("{}{}", prefix, truncate(&node.name, 40 - prefix.len().min(30)));
        if node.is_leaf() || node.total != 0.0 {
            println!("   {:40} │ {:>14}", label, money(node.total));
        } else {
            println!("   {:40} │", label);
        }
        for child in &node.children {
            print_node(child, indent + 1);
        }
    }

    for root in &statement.roots {
        print_node(root, 0);
    }

    Ok(())
}

pub fn cmd_kpis(file: &Path, aggregator: &Aggregator, json: bool) -> Result<()> {
    let statement = read_statement(file)?;
    let kpis = aggregator.classifier().kpis(&statement.roots);

    if json {
        return print_json(&kpis);
    }

    println!();
    println!("📊 {}", file.display());
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Revenue:     {:>16}", money(kpis.revenue));
    println!("   Expenses:    {:>16}", money(kpis.expenses));
    println!("   Net Income:  {:>16}", money(kpis.net_income));
    println!("   Margin:      {:>15.1}%", kpis.margin());

    Ok(())
}
