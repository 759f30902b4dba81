//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, source selection, formatting)
//! - `statement` - Single-export commands (tree, kpis)
//! - `reports` - Multi-month commands (rollup, trend, dashboard, months)

pub mod core;
pub mod reports;
pub mod statement;

// Re-export command functions for main.rs
pub use core::*;
pub use reports::*;
pub use statement::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
