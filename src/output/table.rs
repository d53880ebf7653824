//! CSV table export
//!
//! The exported table outlives any single run. Each export reads the
//! existing table (if any), folds in the cache's records, deduplicates
//! by url keeping the most recently added row, and rewrites the whole
//! file through a temp-file rename so the table is never half-written.

use crate::cache::Record;
use crate::GleanError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Timestamp rendering used in the table
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the exported table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub name: String,
    pub url: String,
    pub discovered_at: String,
}

impl From<&Record> for TableRow {
    fn from(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            url: record.url.clone(),
            discovered_at: record.discovered_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Counts reported by an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Rows carried over from the existing table
    pub rows_existing: usize,

    /// Rows in the written table
    pub rows_written: usize,
}

/// Merges cache records into the table at `path` and rewrites it
///
/// Works on a first run (no existing table) and with an empty record set
/// (the existing table is rewritten unchanged). Any I/O failure here is
/// fatal to the run: a partially exported table must not be mistaken for
/// a complete one.
pub fn export(records: &[Record], path: &Path) -> Result<ExportStats, GleanError> {
    let existing = read_existing(path)?;
    let mut stats = ExportStats {
        rows_existing: existing.len(),
        ..Default::default()
    };

    // Later rows win: a url re-added keeps its original position but
    // takes the most recently added name/timestamp.
    let mut rows: Vec<TableRow> = Vec::with_capacity(existing.len() + records.len());
    let mut index_by_url: HashMap<String, usize> = HashMap::new();

    for row in existing.into_iter().chain(records.iter().map(TableRow::from)) {
        match index_by_url.get(&row.url) {
            Some(&i) => rows[i] = row,
            None => {
                index_by_url.insert(row.url.clone(), rows.len());
                rows.push(row);
            }
        }
    }

    stats.rows_written = rows.len();
    write_table(&rows, path)?;

    tracing::info!(
        "Exported {} rows to {} ({} carried over)",
        stats.rows_written,
        path.display(),
        stats.rows_existing
    );
    Ok(stats)
}

/// Reads the existing table, tolerating its absence on a first run
fn read_existing(path: &Path) -> Result<Vec<TableRow>, GleanError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: TableRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

/// Writes the whole table via write-temp-then-rename
fn write_table(rows: &[TableRow], path: &Path) -> Result<(), GleanError> {
    let tmp_path = path.with_extension("csv.tmp");

    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(|e| GleanError::Persist {
            path: tmp_path.clone(),
            source: e,
        })?;
    }

    std::fs::rename(&tmp_path, path).map_err(|e| GleanError::Persist {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str, url: &str) -> Record {
        Record::new(name, url)
    }

    fn urls_in(path: &Path) -> Vec<String> {
        read_existing(path)
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect()
    }

    #[test]
    fn test_first_export_writes_all_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");

        let records = vec![record("proj1", "u1"), record("proj2", "u2")];
        let stats = export(&records, &path).unwrap();

        assert_eq!(stats.rows_existing, 0);
        assert_eq!(stats.rows_written, 2);
        assert_eq!(urls_in(&path), vec!["u1", "u2"]);
    }

    #[test]
    fn test_export_merges_with_existing_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");

        export(&[record("proj1", "u1")], &path).unwrap();
        let stats = export(&[record("proj2", "u2")], &path).unwrap();

        assert_eq!(stats.rows_existing, 1);
        assert_eq!(stats.rows_written, 2);
        assert_eq!(urls_in(&path), vec!["u1", "u2"]);
    }

    #[test]
    fn test_reexport_deduplicates_by_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");

        export(&[record("proj1", "u1"), record("proj2", "u2")], &path).unwrap();
        // Same urls again, one renamed: most recently added version wins
        let stats = export(&[record("proj1-renamed", "u1")], &path).unwrap();

        assert_eq!(stats.rows_written, 2);
        let rows = read_existing(&path).unwrap();
        assert_eq!(rows[0].name, "proj1-renamed");
        assert_eq!(rows[0].url, "u1");
    }

    #[test]
    fn test_empty_records_rewrite_table_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");

        export(&[record("proj1", "u1")], &path).unwrap();
        let before = read_existing(&path).unwrap();

        let stats = export(&[], &path).unwrap();
        assert_eq!(stats.rows_written, 1);
        assert_eq!(read_existing(&path).unwrap(), before);
    }

    #[test]
    fn test_export_with_nothing_at_all() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");

        let stats = export(&[], &path).unwrap();
        assert_eq!(stats.rows_written, 0);
        assert!(path.exists());
    }
}
