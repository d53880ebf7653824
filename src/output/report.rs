//! Run summary and snapshot statistics
//!
//! The summary is always printed at run end, failed pages included, so
//! an operator can see at a glance whether a rerun is worthwhile.

use crate::cache::CacheState;
use std::time::Duration;

/// Tally of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages that reached a terminal state
    pub pages_attempted: usize,

    /// Pages that ended in a fetch failure
    pub pages_failed: usize,

    /// Records in the cache after the run
    pub records_total: usize,

    /// Records this run added
    pub records_new: usize,

    /// Matched items skipped as malformed
    pub malformed_items: usize,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

/// Prints the end-of-run summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("\nScraping completed in {:.2} seconds", summary.elapsed.as_secs_f64());
    println!("  Pages attempted: {}", summary.pages_attempted);
    println!("  Pages failed:    {}", summary.pages_failed);
    println!("  Total records:   {}", summary.records_total);
    println!("  New records:     {}", summary.records_new);
    if summary.malformed_items > 0 {
        println!("  Malformed items skipped: {}", summary.malformed_items);
    }
}

/// Prints snapshot statistics for the --stats mode
pub fn print_snapshot_stats(state: &CacheState) {
    println!("=== Cache Snapshot ===\n");
    println!("  Seen urls: {}", state.seen_count());
    println!("  Records:   {}", state.records.len());

    match &state.config_hash {
        Some(hash) => println!("  Config hash: {}", hash),
        None => println!("  Config hash: (none recorded)"),
    }

    if let Some(newest) = state.records.iter().map(|r| r.discovered_at).max() {
        println!("  Most recent discovery: {}", newest.format("%Y-%m-%d %H:%M:%S"));
    }
}
