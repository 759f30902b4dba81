//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use pulse_core::{DataSource, DemoSource, Period};

use crate::cli::{Cli, Commands, SourceArgs};
use crate::commands::{self, money, truncate};

const E_CSV: &str = "Line Item,Dr. A,Dr. B,All Employees
Income,,,
  Patient Revenue,\"$1,000.00\",$500.00,\"$1,500.00\"
Total Revenue,\"$1,000.00\",$500.00,\"$1,500.00\"
Expenses,,,
  Payroll Expense,$400.00,$300.00,$700.00
Total Expenses,$400.00,$300.00,$700.00
";

const O_CSV: &str = "Line Item,Clinic,
Income,,
  Dental Revenue,\"$2,000.00\",\"$2,000.00\"
Total Income,\"$2,000.00\",\"$2,000.00\"
Expenses,,
  Dental Supplies,$300.00,$300.00
  Rent,\"$1,500.00\",\"$1,500.00\"
Total Expenses,\"$1,800.00\",\"$1,800.00\"
";

fn upload_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("2024-01_E.csv"), E_CSV).unwrap();
    fs::write(dir.path().join("2024-01_O.csv"), O_CSV).unwrap();
    dir
}

fn dir_args(path: &Path) -> SourceArgs {
    SourceArgs {
        dir: Some(path.to_path_buf()),
        demo: false,
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

// ========== Statement Command Tests ==========

#[test]
fn test_cmd_tree() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "statement.csv", E_CSV);
    assert!(commands::cmd_tree(&file, false).is_ok());
    assert!(commands::cmd_tree(&file, true).is_ok());
}

#[test]
fn test_cmd_tree_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::cmd_tree(&dir.path().join("missing.csv"), false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_tree_without_line_item_column() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "bad.csv", "Name,Amount\nRent,10\n");
    let err = commands::cmd_tree(&file, false).unwrap_err();
    assert!(format!("{:#}", err).contains("Line Item"));
}

#[test]
fn test_cmd_kpis() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_file(dir.path(), "2024-01_O.csv", O_CSV);
    let aggregator = commands::load_aggregator(None).unwrap();
    assert!(commands::cmd_kpis(&file, &aggregator, false).is_ok());
    assert!(commands::cmd_kpis(&file, &aggregator, true).is_ok());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_rollup_both_kinds() {
    let dir = upload_dir();
    let source = commands::open_source(&dir_args(dir.path())).unwrap();
    let aggregator = commands::load_aggregator(None).unwrap();

    for kind in ["employee", "business", "E", "o"] {
        let result = commands::cmd_rollup(source.as_ref(), &aggregator, kind, &[], false);
        assert!(result.is_ok(), "rollup --kind {} failed", kind);
    }
}

#[test]
fn test_cmd_rollup_invalid_kind() {
    let aggregator = commands::load_aggregator(None).unwrap();
    let result = commands::cmd_rollup(&DemoSource::new(), &aggregator, "vendors", &[], false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_rollup_month_filter() {
    let aggregator = commands::load_aggregator(None).unwrap();
    let months = vec!["2024-02".to_string()];
    assert!(commands::cmd_rollup(&DemoSource::new(), &aggregator, "e", &months, true).is_ok());

    let bad = vec!["Feb 2024".to_string()];
    assert!(commands::cmd_rollup(&DemoSource::new(), &aggregator, "e", &bad, false).is_err());
}

#[test]
fn test_cmd_trend_and_dashboard() {
    let dir = upload_dir();
    let source = commands::open_source(&dir_args(dir.path())).unwrap();
    let aggregator = commands::load_aggregator(None).unwrap();

    assert!(commands::cmd_trend(source.as_ref(), &aggregator, false).is_ok());
    assert!(commands::cmd_dashboard(source.as_ref(), &aggregator, 5, false).is_ok());
    assert!(commands::cmd_dashboard(source.as_ref(), &aggregator, 5, true).is_ok());
}

#[test]
fn test_cmd_dashboard_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let source = commands::open_source(&dir_args(dir.path())).unwrap();
    let aggregator = commands::load_aggregator(None).unwrap();

    assert!(commands::cmd_dashboard(source.as_ref(), &aggregator, 5, false).is_ok());
    assert!(commands::cmd_trend(source.as_ref(), &aggregator, false).is_ok());
    assert!(commands::cmd_months(source.as_ref()).is_ok());
}

#[test]
fn test_cmd_months_demo() {
    let source = commands::open_source(&SourceArgs {
        dir: None,
        demo: true,
    })
    .unwrap();
    assert_eq!(source.periods().unwrap().len(), 3);
    assert!(commands::cmd_months(source.as_ref()).is_ok());
}

// ========== Shared Utility Tests ==========

#[test]
fn test_open_source_requires_dir_or_demo() {
    let result = commands::open_source(&SourceArgs {
        dir: None,
        demo: false,
    });
    assert!(result.is_err());

    let dir = tempfile::tempdir().unwrap();
    let result = commands::open_source(&dir_args(&dir.path().join("missing")));
    assert!(result.is_err());
}

#[test]
fn test_load_aggregator_with_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "rollup.toml",
        "[business]\nestimated_expense_ratio = 0.4\n",
    );
    let aggregator = commands::load_aggregator(Some(&path)).unwrap();
    assert_eq!(aggregator.config().business.estimated_expense_ratio, 0.4);

    let bad = write_file(
        dir.path(),
        "bad.toml",
        "[business]\nestimated_expense_ratio = 4.0\n",
    );
    assert!(commands::load_aggregator(Some(&bad)).is_err());
}

#[test]
fn test_parse_months() {
    let periods = commands::parse_months(&["2024-01".to_string(), "2023-12".to_string()]).unwrap();
    assert_eq!(
        periods,
        vec![Period::new(2024, 1).unwrap(), Period::new(2023, 12).unwrap()]
    );
    assert!(commands::parse_months(&["2024-13".to_string()]).is_err());
}

#[test]
fn test_money() {
    assert_eq!(money(0.0), "$0.00");
    assert_eq!(money(12.5), "$12.50");
    assert_eq!(money(1234.5), "$1,234.50");
    assert_eq!(money(-1234567.891), "-$1,234,567.89");
    assert_eq!(money(-0.001), "$0.00");
}

#[test]
fn test_truncate() {
    assert_eq!(truncate("Dental", 10), "Dental");
    assert_eq!(truncate("Operating Expenses", 10), "Operati...");
    assert_eq!(truncate("Café Revenue", 7), "Café...");
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_cli_parses_rollup() {
    let cli = Cli::try_parse_from([
        "pulse", "rollup", "--dir", "uploads", "--kind", "o", "--month", "2024-01", "--month",
        "2024-02",
    ])
    .unwrap();
    match cli.command {
        Commands::Rollup {
            source,
            kind,
            month,
            json,
        } => {
            assert_eq!(source.dir, Some(PathBuf::from("uploads")));
            assert!(!source.demo);
            assert_eq!(kind, "o");
            assert_eq!(month.len(), 2);
            assert!(!json);
        }
        _ => panic!("expected rollup command"),
    }
}

#[test]
fn test_cli_rejects_dir_with_demo() {
    let result = Cli::try_parse_from(["pulse", "trend", "--dir", "uploads", "--demo"]);
    assert!(result.is_err());
}

#[test]
fn test_cli_global_flags() {
    let cli = Cli::try_parse_from([
        "pulse",
        "dashboard",
        "--demo",
        "--verbose",
        "--config",
        "rollup.toml",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("rollup.toml")));
    assert!(matches!(cli.command, Commands::Dashboard { limit: 5, .. }));
}
