//! Gleaner: an incremental listing scraper
//!
//! This crate discovers a paginated listing from a seed URL, fetches the
//! pages through a bounded worker pool with randomized pacing and identity
//! rotation, extracts (name, url) records, and deduplicates them against a
//! durable cache so that repeated or interrupted runs never reprocess
//! already-seen items.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod output;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pagination discovery failed for {url}: {message}")]
    Discovery { url: String, message: String },

    #[error("Failed to persist {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache snapshot at {path} is not readable: {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error("Export table error: {0}")]
    Table(#[from] csv::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CacheState, DedupCache, Record};
pub use config::Config;
pub use crawler::{FetchError, Identity, Pipeline};
pub use output::RunSummary;
