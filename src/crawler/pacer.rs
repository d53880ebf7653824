//! Randomized request pacing
//!
//! A bounded uniform delay before each fetch keeps the request pattern
//! from bursting. There is no correctness dependency on the delay; tests
//! use the zero-delay variant.

use rand::Rng;
use std::time::Duration;

/// Draws a uniform delay in `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        debug_assert!(min_ms <= max_ms);
        Self { min_ms, max_ms }
    }

    /// Zero-delay pacer for tests
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    /// The delay to sleep before the next fetch
    pub fn delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}
