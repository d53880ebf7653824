//! Gleaner main entry point
//!
//! Command-line interface for the incremental listing scraper.

use clap::Parser;
use gleaner::config::load_config_with_hash;
use gleaner::crawler::Pipeline;
use gleaner::output;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Gleaner: an incremental listing scraper
///
/// Gleaner discovers a paginated listing from a seed URL, extracts
/// (name, url) records through a bounded worker pool, deduplicates them
/// against a durable cache, and merges the result into a CSV table.
/// Reruns are safe: already-seen records are never reprocessed.
#[derive(Parser, Debug)]
#[command(name = "gleaner")]
#[command(version)]
#[command(about = "An incremental listing scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the existing cache snapshot and start empty
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be scraped without fetching
    #[arg(long, conflicts_with_all = ["stats", "export_only"])]
    dry_run: bool,

    /// Show cache snapshot statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_only"])]
    stats: bool,

    /// Merge the cache into the output table without fetching anything
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_only {
        handle_export_only(&config)?;
    } else {
        handle_scrape(config, config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("gleaner=info,warn"),
            1 => EnvFilter::new("gleaner=debug,info"),
            2 => EnvFilter::new("gleaner=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows what would be scraped
fn handle_dry_run(config: &gleaner::Config) {
    println!("=== Gleaner Dry Run ===\n");

    println!("Source:");
    println!("  Seed URL: {}", config.source.seed_url);
    println!("  Record selector:     {}", config.source.record_selector);
    println!("  Link selector:       {}", config.source.link_selector);
    println!("  Pagination selector: {}", config.source.pagination_selector);

    println!("\nPipeline:");
    println!("  Workers: {}", config.pipeline.max_workers);
    println!(
        "  Delay: {}..{} ms",
        config.pipeline.min_delay_ms, config.pipeline.max_delay_ms
    );
    println!("  Fetch timeout: {}s", config.pipeline.fetch_timeout_secs);
    println!("  Extract wait:  {}s", config.pipeline.extract_wait_secs);
    println!("  Rotation: {:?}", config.pipeline.rotation);

    println!("\nIdentity pools:");
    println!("  Proxies: {}", config.identity.proxies.len());
    println!("  User agents: {}", config.identity.user_agents.len());

    println!("\nOutput:");
    println!("  Cache: {}", config.output.cache_path);
    println!("  Table: {}", config.output.table_path);

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints snapshot statistics without fetching
fn handle_stats(config: &gleaner::Config) -> anyhow::Result<()> {
    let cache = gleaner::DedupCache::new(&config.output.cache_path);
    let state = cache.load()?;
    output::print_snapshot_stats(&state);
    Ok(())
}

/// Handles --export-only: reconciles the cache into the table
fn handle_export_only(config: &gleaner::Config) -> anyhow::Result<()> {
    let cache = gleaner::DedupCache::new(&config.output.cache_path);
    let state = cache.load()?;

    let stats = output::export(&state.records, Path::new(&config.output.table_path))?;
    println!(
        "Exported {} rows to {}",
        stats.rows_written, config.output.table_path
    );
    Ok(())
}

/// Handles the main scrape: run the pipeline, then export
async fn handle_scrape(
    config: gleaner::Config,
    config_hash: String,
    fresh: bool,
) -> anyhow::Result<()> {
    let table_path = PathBuf::from(&config.output.table_path);
    let mut pipeline = Pipeline::new(config, Some(config_hash), fresh)?;

    // Ctrl-C stops dispatching new pages; in-flight fetches finish under
    // their own timeout and the persisted cache remains resumable.
    let cancel = pipeline.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancellation requested, finishing in-flight pages");
            cancel.store(true, std::sync::atomic::Ordering::Relaxed);
        }
    });

    let summary = pipeline.run().await?;

    output::export(&pipeline.state().records, &table_path)?;
    output::print_summary(&summary);
    println!("Data saved to {}", table_path.display());

    Ok(())
}
