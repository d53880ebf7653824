//! Pipeline orchestration
//!
//! This module contains the run loop that coordinates the whole scrape:
//! - Discovering the page set (seed + pagination links not already seen)
//! - Dispatching fetch/extract work across a bounded worker pool
//! - Merging each completed unit into the dedup cache and persisting it
//! - Reporting per-unit failures without aborting the run
//!
//! Workers never touch the cache. They return their outcome to the
//! coordinating task, which is the sole mutator: it merges and persists
//! one outcome at a time, so two completions can never race on the seen
//! set and a crash loses at most the in-flight batch.

use crate::cache::{CacheState, DedupCache, Record};
use crate::config::{Config, RotationKey};
use crate::crawler::extractor::{self, Selectors};
use crate::crawler::fetcher::{fetch_page, FetchError};
use crate::crawler::identity::{Identity, IdentityRotator};
use crate::crawler::pacer::Pacer;
use crate::output::RunSummary;
use crate::GleanError;
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// How often a page is re-polled while waiting for its content markers
const MARKER_POLL: Duration = Duration::from_millis(500);

/// One page to visit. Created during discovery, consumed exactly once,
/// never re-enqueued.
#[derive(Debug, Clone)]
pub struct PageUnit {
    pub url: String,
}

/// Terminal state of a page unit
///
/// A unit goes Pending (in the discovered set) to InFlight (claimed by a
/// worker) to one of these. Terminal states are never retried; a failed
/// unit contributes zero records and is counted in the summary.
#[derive(Debug)]
enum PageOutcome {
    Completed {
        url: String,
        records: Vec<Record>,
        malformed: usize,
    },
    Failed {
        url: String,
        error: FetchError,
    },
}

/// Coordinates discovery, the worker pool, and cache persistence
pub struct Pipeline {
    config: Arc<Config>,
    selectors: Arc<Selectors>,
    rotator: Arc<IdentityRotator>,
    pacer: Pacer,
    cache: DedupCache,
    state: CacheState,
    cancel: Arc<AtomicBool>,
}

impl Pipeline {
    /// Creates a pipeline, loading the persisted snapshot unless `fresh`
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash of the config file, recorded in the snapshot
    /// * `fresh` - Ignore any existing snapshot and start empty
    pub fn new(
        config: Config,
        config_hash: Option<String>,
        fresh: bool,
    ) -> Result<Self, GleanError> {
        let selectors = Selectors::from_config(&config.source)?;
        let cache = DedupCache::new(&config.output.cache_path);

        let mut state = if fresh {
            tracing::info!("Starting fresh, ignoring any existing snapshot");
            CacheState::empty()
        } else {
            cache.load()?
        };

        if let (Some(previous), Some(current)) = (&state.config_hash, &config_hash) {
            if previous != current {
                tracing::warn!("Configuration changed since the snapshot was written");
            }
        }
        state.config_hash = config_hash;

        Ok(Self {
            pacer: Pacer::new(config.pipeline.min_delay_ms, config.pipeline.max_delay_ms),
            rotator: Arc::new(IdentityRotator::new(&config.identity)),
            selectors: Arc::new(selectors),
            config: Arc::new(config),
            cache,
            state,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that stops dispatching new units when set
    ///
    /// In-flight fetches finish under their own timeout; already-persisted
    /// state remains valid and a later run resumes from it.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// The cache state accumulated so far
    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// Runs discovery and the worker pool to completion
    pub async fn run(&mut self) -> Result<RunSummary, GleanError> {
        let started = Instant::now();
        let units = self.discover().await;

        let workers = self.config.pipeline.max_workers as usize;
        tracing::info!("Scraping {} pages with {} workers", units.len(), workers);

        // Workers get an immutable snapshot of the seen set for early
        // membership checks; the merge below stays authoritative.
        let seen_snapshot: Arc<HashSet<String>> =
            Arc::new(self.state.seen.keys().cloned().collect());
        let seen_cardinality = Arc::new(AtomicUsize::new(self.state.seen_count()));
        let request_counter = Arc::new(AtomicUsize::new(0));

        let rotation = self.config.pipeline.rotation;
        let fetch_timeout = self.config.pipeline.fetch_timeout();
        let extract_wait = self.config.pipeline.extract_wait();
        let pacer = self.pacer;

        // The worker closures own their clones so the stream borrows
        // nothing from self; the consume loop below is then free to be
        // the sole mutator of the cache state.
        let pool_selectors = Arc::clone(&self.selectors);
        let pool_rotator = Arc::clone(&self.rotator);
        let pool_cancel = Arc::clone(&self.cancel);
        let pool_cardinality = Arc::clone(&seen_cardinality);

        let mut summary = RunSummary::default();

        let mut outcomes = stream::iter(units)
            .map(move |unit| {
                let selectors = Arc::clone(&pool_selectors);
                let rotator = Arc::clone(&pool_rotator);
                let seen = Arc::clone(&seen_snapshot);
                let seen_cardinality = Arc::clone(&pool_cardinality);
                let request_counter = Arc::clone(&request_counter);
                let cancel = Arc::clone(&pool_cancel);

                async move {
                    if cancel.load(Ordering::Relaxed) {
                        tracing::debug!("Skipping {} after cancellation", unit.url);
                        return None;
                    }

                    tokio::time::sleep(pacer.delay()).await;

                    let index = match rotation {
                        RotationKey::SeenCount => seen_cardinality.load(Ordering::Relaxed),
                        RotationKey::RequestIndex => {
                            request_counter.fetch_add(1, Ordering::Relaxed)
                        }
                    };
                    let identity = rotator.select(index);

                    Some(visit_page(unit, identity, fetch_timeout, extract_wait, selectors, seen).await)
                }
            })
            .buffer_unordered(workers.max(1));

        while let Some(maybe_outcome) = outcomes.next().await {
            let Some(outcome) = maybe_outcome else {
                continue;
            };
            summary.pages_attempted += 1;

            match outcome {
                PageOutcome::Completed {
                    url,
                    records,
                    malformed,
                } => {
                    summary.malformed_items += malformed;

                    if !records.is_empty() {
                        let merged = self.state.merge(records);
                        if merged.added > 0 {
                            // Persist before accepting the next outcome so a
                            // crash never loses more than the in-flight batch.
                            self.cache.persist(&self.state)?;
                            seen_cardinality.store(self.state.seen_count(), Ordering::Relaxed);
                            summary.records_new += merged.added;
                        }
                    }

                    tracing::debug!(
                        "Completed {} ({}/{} pages)",
                        url,
                        summary.pages_attempted - summary.pages_failed,
                        summary.pages_attempted
                    );
                }

                PageOutcome::Failed { url, error } => {
                    summary.pages_failed += 1;
                    tracing::warn!("Page {} failed: {}", url, error);
                }
            }
        }

        // Final persist records the config hash even when nothing was new
        self.cache.persist(&self.state)?;

        summary.records_total = self.state.records.len();
        summary.elapsed = started.elapsed();

        tracing::info!(
            "Run finished: {} attempted, {} failed, {} new records in {:?}",
            summary.pages_attempted,
            summary.pages_failed,
            summary.records_new,
            summary.elapsed
        );

        Ok(summary)
    }

    /// Discovers the full page set before dispatch
    ///
    /// Fetches the seed, extracts pagination links, and drops links
    /// already marked seen. The seed itself is always visited; the
    /// idempotent merge makes a revisit contribute nothing. A discovery
    /// failure degrades to the seed-only set rather than aborting.
    async fn discover(&self) -> Vec<PageUnit> {
        let seed = self.config.source.seed_url.clone();
        let mut units = vec![PageUnit { url: seed.clone() }];

        let identity = self.rotator.select(0);
        let html = match fetch_page(&seed, &identity, self.config.pipeline.fetch_timeout()).await {
            Ok(html) => html,
            Err(e) => {
                let err = GleanError::Discovery {
                    url: seed,
                    message: e.to_string(),
                };
                tracing::warn!("{err}; continuing with the seed page only");
                return units;
            }
        };

        let base = match Url::parse(&seed) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Seed url did not parse ({e}); continuing with the seed page only");
                return units;
            }
        };

        for link in extractor::pagination_links(&html, &base, &self.selectors) {
            if link == seed || self.state.is_seen(&link) {
                continue;
            }
            units.push(PageUnit { url: link });
        }

        tracing::info!("Discovered {} pages from {}", units.len(), base);
        units
    }
}

/// Fetches a page, re-polling until its content markers appear or the
/// wait budget runs out
///
/// A page whose markers never appear is returned as-is: extraction then
/// yields zero records, which is the soft extraction-timeout outcome,
/// not a page failure.
async fn fetch_until_markers(
    url: &str,
    identity: &Identity,
    timeout: Duration,
    wait: Duration,
    selectors: &Selectors,
) -> Result<String, FetchError> {
    let deadline = Instant::now() + wait;

    loop {
        let html = fetch_page(url, identity, timeout).await?;
        if extractor::has_markers(&html, selectors) {
            return Ok(html);
        }
        if Instant::now() + MARKER_POLL >= deadline {
            tracing::debug!("Content markers never appeared for {}", url);
            return Ok(html);
        }
        tokio::time::sleep(MARKER_POLL).await;
    }
}

/// Executes one page unit: pace, fetch, extract, pre-filter
async fn visit_page(
    unit: PageUnit,
    identity: Identity,
    timeout: Duration,
    extract_wait: Duration,
    selectors: Arc<Selectors>,
    seen: Arc<HashSet<String>>,
) -> PageOutcome {
    let base = match Url::parse(&unit.url) {
        Ok(base) => base,
        Err(e) => {
            return PageOutcome::Failed {
                error: FetchError::Network {
                    url: unit.url.clone(),
                    message: format!("unparseable page url: {e}"),
                },
                url: unit.url,
            }
        }
    };

    match fetch_until_markers(&unit.url, &identity, timeout, extract_wait, &selectors).await {
        Ok(html) => {
            let extraction = extractor::extract_records(&html, &base, &selectors);
            let records = extraction
                .records
                .into_iter()
                .filter(|c| !seen.contains(&c.url))
                .map(|c| Record::new(c.name, c.url))
                .collect();

            PageOutcome::Completed {
                url: unit.url,
                records,
                malformed: extraction.malformed,
            }
        }
        Err(error) => PageOutcome::Failed {
            url: unit.url,
            error,
        },
    }
}
