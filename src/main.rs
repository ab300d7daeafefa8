//! PriceLens main entry point
//!
//! This is the command-line interface for the PriceLens marketplace scraper.

use anyhow::{bail, Context};
use clap::Parser;
use pricelens::config::{load_config_with_hash, Config};
use pricelens::output::{load_statistics, print_statistics, print_variants};
use pricelens::storage::open_storage;
use pricelens::{Coordinator, ProductIdentifier};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// PriceLens: rate-governed marketplace price scraper
///
/// PriceLens fetches product cards from marketplace APIs while staying under
/// the configured request budget, resolves their CDN images, and records
/// every size's price in a local database.
#[derive(Parser, Debug)]
#[command(name = "pricelens")]
#[command(version)]
#[command(about = "A rate-governed marketplace price scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Article ids or catalog URLs to scrape
    #[arg(value_name = "IDENTIFIERS")]
    identifiers: Vec<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the effective settings without scraping
    #[arg(long, conflicts_with_all = ["stats", "no_save"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "no_save"])]
    stats: bool,

    /// Print scraped products without saving them
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config, &cli.identifiers)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_scrape(&config, &cli.identifiers, !cli.no_save).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pricelens=info,warn"),
            1 => EnvFilter::new("pricelens=debug,info"),
            2 => EnvFilter::new("pricelens=trace,debug"),
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

fn parse_identifiers(raw: &[String]) -> anyhow::Result<Vec<ProductIdentifier>> {
    raw.iter()
        .map(|s| {
            s.parse::<ProductIdentifier>()
                .with_context(|| format!("Invalid product identifier '{}'", s))
        })
        .collect()
}

/// Handles the --dry-run mode: validates config and identifiers
fn handle_dry_run(config: &Config, identifiers: &[String]) -> anyhow::Result<()> {
    let identifiers = parse_identifiers(identifiers)?;

    println!("=== PriceLens Dry Run ===\n");

    println!("Scraper:");
    println!("  Default marketplace: {}", config.scraper.default_marketplace);
    println!(
        "  Max concurrent fetches: {}",
        config.scraper.max_concurrent_fetches
    );
    println!(
        "  Max attempts: {} (backoff {}ms)",
        config.scraper.max_attempts, config.scraper.retry_backoff_ms
    );

    let rate = &config.rate_limit;
    println!("\nRate Limit:");
    println!("  {} requests per {}s", rate.limit, rate.period);
    println!("  {} requests per {}s burst", rate.burst, rate.interval);
    println!(
        "  Status {} costs {}",
        rate.penalized_status, rate.penalty_weight
    );

    println!("\nWildberries:");
    println!("  Detail endpoint: {}", config.wildberries.detail_endpoint);
    println!("  Image template: {}", config.wildberries.image_template);
    println!("  Shards probed: 01-{:02}", config.wildberries.max_shards);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nIdentifiers ({}):", identifiers.len());
    for identifier in &identifiers {
        println!("  - {}", identifier);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, identifiers: &[String], save: bool) -> anyhow::Result<()> {
    let identifiers = parse_identifiers(identifiers)?;
    if identifiers.is_empty() {
        bail!("No product identifiers given");
    }

    let coordinator = Coordinator::new(config)?;

    if !save {
        let mut failures = 0;
        for (identifier, result) in identifiers
            .iter()
            .zip(coordinator.fetch_many(&identifiers).await)
        {
            match result {
                Ok(variants) => print_variants(&variants),
                Err(e) => {
                    failures += 1;
                    tracing::error!("Failed to fetch {}: {}", identifier, e);
                }
            }
        }
        if failures == identifiers.len() {
            bail!("Every product failed to fetch");
        }
        return Ok(());
    }

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    let report = coordinator.scrape_and_save(&identifiers, &mut storage).await;

    for variants in &report.products {
        print_variants(variants);
    }
    println!(
        "Scraped {}/{} products, saved {} variants",
        report.succeeded,
        report.requested,
        report.saved_ids.len()
    );
    for (identifier, error) in &report.failed {
        println!("  ✗ {}: {}", identifier, error);
    }

    if report.succeeded == 0 {
        bail!("Every product failed to scrape");
    }

    Ok(())
}
