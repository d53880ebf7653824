use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    pub output: OutputConfig,
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Entry point of the paginated listing
    #[serde(rename = "seed-url")]
    pub seed_url: String,

    /// CSS selector matching one record container on a page
    #[serde(rename = "record-selector", default = "default_record_selector")]
    pub record_selector: String,

    /// CSS selector for the link inside a record container
    #[serde(rename = "link-selector", default = "default_link_selector")]
    pub link_selector: String,

    /// CSS selector matching pagination links on the seed page
    #[serde(
        rename = "pagination-selector",
        default = "default_pagination_selector"
    )]
    pub pagination_selector: String,
}

/// Worker pool and pacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of pages fetched concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Lower bound of the randomized pre-fetch delay (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pre-fetch delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Hard deadline for a single page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// How long to re-poll a page for its content markers (seconds)
    #[serde(rename = "extract-wait-secs", default = "default_extract_wait")]
    pub extract_wait_secs: u64,

    /// Which counter drives identity rotation
    #[serde(default)]
    pub rotation: RotationKey,
}

/// Index source for proxy/user-agent rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RotationKey {
    /// Rotate by the number of urls already marked seen
    #[default]
    SeenCount,
    /// Rotate by a monotonic per-request counter
    RequestIndex,
}

/// Proxy and user-agent pools
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityConfig {
    /// Proxy URLs to cycle through; empty means direct connections
    #[serde(default)]
    pub proxies: Vec<String>,

    /// User-agent strings to cycle through; empty means a fixed default
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSON cache snapshot
    #[serde(rename = "cache-path")]
    pub cache_path: String,

    /// Path to the exported CSV table
    #[serde(rename = "table-path")]
    pub table_path: String,
}

impl PipelineConfig {
    /// Per-fetch deadline as a Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Marker re-poll bound as a Duration
    pub fn extract_wait(&self) -> Duration {
        Duration::from_secs(self.extract_wait_secs)
    }
}

fn default_record_selector() -> String {
    "h1.h3.lh-condensed".to_string()
}

fn default_link_selector() -> String {
    "a[href]".to_string()
}

fn default_pagination_selector() -> String {
    "a[class*='paginate']".to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_extract_wait() -> u64 {
    15
}
