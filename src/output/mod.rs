//! Export and reporting
//!
//! This module reconciles the cache's record set with the durable CSV
//! table and renders the end-of-run summary.

mod report;
mod table;

pub use report::{print_snapshot_stats, print_summary, RunSummary};
pub use table::{export, ExportStats, TableRow};
