//! Durable dedup cache
//!
//! This module persists the dedup state across runs:
//! - Loading the snapshot (or starting empty when none exists)
//! - Writing the whole snapshot atomically via write-temp-then-rename
//!
//! A persist failure is fatal to the run: continuing after one risks an
//! on-disk cache that disagrees with what the run believes it saved.

mod snapshot;

pub use snapshot::{CacheState, MergeOutcome, Record};

use crate::GleanError;
use std::path::{Path, PathBuf};

/// Handle to the on-disk snapshot location
pub struct DedupCache {
    path: PathBuf,
}

impl DedupCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted snapshot, or returns the empty state if the
    /// file does not exist. A present-but-unreadable snapshot is an error:
    /// silently starting empty would re-report every record as new.
    pub fn load(&self) -> Result<CacheState, GleanError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No snapshot at {}, starting empty", self.path.display());
                return Ok(CacheState::empty());
            }
            Err(e) => {
                return Err(GleanError::Snapshot {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        };

        serde_json::from_str(&content).map_err(|e| GleanError::Snapshot {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Writes the full state atomically
    ///
    /// The snapshot is serialized to a sibling temp file and renamed into
    /// place, so a reader never observes a half-written snapshot.
    pub fn persist(&self, state: &CacheState) -> Result<(), GleanError> {
        let json = serde_json::to_string_pretty(state).map_err(|e| GleanError::Snapshot {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| GleanError::Persist {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| GleanError::Persist {
            path: self.path.clone(),
            source: e,
        })?;

        tracing::trace!(
            "Persisted snapshot: {} seen, {} records",
            state.seen_count(),
            state.records.len()
        );
        Ok(())
    }
}
