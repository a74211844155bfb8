//! Crash-Harvest main entry point
//!
//! This is the command-line interface for the Crash-Harvest report harvester.

use anyhow::Context;
use clap::Parser;
use crash_harvest::config::{load_config_with_hash, Config};
use crash_harvest::crawler::crawl;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crash-Harvest: an incremental crash report harvester
///
/// Crash-Harvest walks every injury category of a crash reporting portal,
/// stores each incident it has not stored before, and reports how many
/// incidents were persisted, skipped and failed.
#[derive(Parser, Debug)]
#[command(name = "crash-harvest")]
#[command(version)]
#[command(about = "An incremental crash report harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without harvesting
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the record database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crash_harvest=info,warn"),
            1 => EnvFilter::new("crash_harvest=debug,info"),
            2 => EnvFilter::new("crash_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Crash-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Search endpoint: {}", config.source.search_url);
    println!("  Detail endpoint: {}", config.source.detail_url);
    println!("  Identifier parameter: {}", config.source.id_param);
    println!("  Category field: {}", config.source.category_field);

    println!("\nClient:");
    println!("  User agent: {}", config.client.user_agent);
    println!("  Timeout: {}s", config.client.timeout_secs);

    println!("\nCrawler:");
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);
    println!("  Retry delay: {}ms", config.crawler.retry_delay_ms);

    println!("\nCache:");
    println!("  Path: {}", config.cache.path);
    println!("  Freshness: {}h", config.cache.ttl_hours);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the record database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use crash_harvest::output::{load_statistics, print_statistics};
    use crash_harvest::storage::open_storage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open {}", config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} into {}",
        config.source.search_url,
        config.output.database_path
    );

    let summary = crawl(config, config_hash).await.context("Harvest failed")?;

    println!("{}", summary);
    if !summary.is_clean() {
        tracing::warn!("Run finished with failures; see crawl_failures for details");
    }

    Ok(())
}
