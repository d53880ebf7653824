//! Cache snapshot state and merge semantics
//!
//! The snapshot is the durable dedup state: a url→true map of everything
//! already accounted for, plus the ordered list of records discovered so
//! far. It is always written as a whole, never appended field-by-field, so
//! a crash loses at most the in-flight batch and never corrupts prior
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A discovered listing entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,

    /// Canonical URL, the unique key for dedup
    pub url: String,

    pub discovered_at: DateTime<Utc>,
}

impl Record {
    /// Creates a record stamped with the current time
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            discovered_at: Utc::now(),
        }
    }
}

/// Result of merging a batch of candidates into the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// How many candidates were new and got appended
    pub added: usize,
}

/// The whole persisted dedup state
///
/// Invariants: every url in `records` is present in `seen`, and `seen`
/// never shrinks. `seen` is a BTreeMap so serialized snapshots are
/// deterministic and `persist(load())` round-trips exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheState {
    /// Hash of the config that produced this snapshot, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,

    /// Authoritative dedup index, serialized as a url→true mapping
    #[serde(default)]
    pub seen: BTreeMap<String, bool>,

    /// Accumulated records, append-only within a run
    #[serde(default)]
    pub records: Vec<Record>,
}

impl CacheState {
    /// An empty state, used when no snapshot exists yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether a url is already accounted for
    pub fn is_seen(&self, url: &str) -> bool {
        self.seen.contains_key(url)
    }

    /// Number of urls marked seen
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Merges candidate records, inserting only urls absent from `seen`
    ///
    /// Candidate order is preserved among the appended records. Re-merging
    /// an already-merged record is a no-op, which is what makes whole-run
    /// reruns convergent.
    pub fn merge(&mut self, candidates: Vec<Record>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for candidate in candidates {
            if self.seen.contains_key(&candidate.url) {
                continue;
            }
            self.seen.insert(candidate.url.clone(), true);
            self.records.push(candidate);
            outcome.added += 1;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, url: &str) -> Record {
        Record::new(name, url)
    }

    #[test]
    fn test_empty_state() {
        let state = CacheState::empty();
        assert_eq!(state.seen_count(), 0);
        assert!(state.records.is_empty());
        assert!(!state.is_seen("u1"));
    }

    #[test]
    fn test_merge_inserts_new_records() {
        let mut state = CacheState::empty();
        let outcome = state.merge(vec![record("proj1", "u1"), record("proj2", "u2")]);

        assert_eq!(outcome.added, 2);
        assert_eq!(state.seen_count(), 2);
        assert!(state.is_seen("u1"));
        assert!(state.is_seen("u2"));
        assert_eq!(state.records[0].name, "proj1");
        assert_eq!(state.records[1].name, "proj2");
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut state = CacheState::empty();
        state.merge(vec![record("proj1", "u1")]);

        let outcome = state.merge(vec![record("proj1", "u1")]);
        assert_eq!(outcome.added, 0);
        assert_eq!(state.seen_count(), 1);
        assert_eq!(state.records.len(), 1);
    }

    #[test]
    fn test_merge_ordering_equivalence() {
        // [A,B] then [B,C] must produce the same seen set as [A,B,C] once
        let mut split = CacheState::empty();
        split.merge(vec![record("a", "A"), record("b", "B")]);
        split.merge(vec![record("b", "B"), record("c", "C")]);

        let mut whole = CacheState::empty();
        whole.merge(vec![record("a", "A"), record("b", "B"), record("c", "C")]);

        assert_eq!(split.seen, whole.seen);
        let split_urls: Vec<_> = split.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(split_urls, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_overlapping_pages_scenario() {
        // Seed page yields (proj1,u1),(proj2,u2); second page yields
        // (proj2,u2),(proj3,u3); u2 must be counted once.
        let mut state = CacheState::empty();
        state.merge(vec![record("proj1", "u1"), record("proj2", "u2")]);
        state.merge(vec![record("proj2", "u2"), record("proj3", "u3")]);

        let urls: Vec<_> = state.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["u1", "u2", "u3"]);
        assert_eq!(state.seen_count(), 3);
    }

    #[test]
    fn test_records_subset_of_seen() {
        let mut state = CacheState::empty();
        state.merge(vec![record("a", "A"), record("b", "B")]);
        state.merge(vec![record("c", "C")]);

        for r in &state.records {
            assert!(state.seen.contains_key(&r.url));
        }
    }
}
