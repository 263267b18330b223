//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl web crawler.

use anyhow::Context;
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, load_seeds, validate, Config};
use ripple_crawl::crawler::crawl;
use ripple_crawl::output::print_report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a polite, concurrent web crawler
///
/// Ripple-Crawl crawls breadth-first from a list of seed URLs while
/// respecting robots.txt and crawl-delay, and archives the pages it fetches
/// into WARC files until the page budget is spent.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version)]
#[command(about = "A polite, concurrent web crawler", long_about = None)]
struct Cli {
    /// Text file with one seed URL per line
    #[arg(short, long, value_name = "SEEDS.txt")]
    seeds: PathBuf,

    /// Maximum number of pages to store
    #[arg(short = 'n', long, value_name = "PAGES")]
    limit: u64,

    /// Write the JSON page log and raise log verbosity
    #[arg(short, long)]
    debug: bool,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Number of concurrent workers (overrides the config file)
    #[arg(long)]
    workers: Option<usize>,

    /// Maximum link depth from the seeds (overrides the config file)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Validate config and seeds and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose + u8::from(cli.debug), cli.quiet);

    let config = resolve_config(&cli)?;

    let seeds = load_seeds(&cli.seeds)
        .with_context(|| format!("Failed to load seeds from {}", cli.seeds.display()))?;
    tracing::info!("Loaded {} seed URLs", seeds.len());

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    let report = crawl(&config, &seeds).await.context("Crawl failed")?;

    tracing::info!(
        "Crawl complete: {} stored, {} refused, {} failed, {} faults ({})",
        report.pages_stored,
        report.refused,
        report.failed,
        report.faults.len(),
        report.stop_reason
    );
    if !cli.quiet {
        print_report(&report);
    }

    Ok(())
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    config.crawler.page_budget = cli.limit;
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = Some(max_depth);
    }
    if cli.debug {
        config.logging.debug = true;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence.
fn setup_logging(verbose: u8, quiet: bool) {
    let default = if quiet {
        "error"
    } else {
        match verbose {
            0 => "ripple_crawl=info,warn",
            1 => "ripple_crawl=debug,info",
            2 => "ripple_crawl=trace,debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== Ripple-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unbounded"),
    }
    println!("  Page budget: {}", config.crawler.page_budget);
    println!("  Dequeue timeout: {}ms", config.crawler.dequeue_timeout_ms);
    println!("  Max empty retries: {}", config.crawler.max_empty_retries);

    println!("\nPoliteness:");
    println!("  Default delay: {}ms", config.politeness.default_delay_ms);
    println!("  Max crawl delay: {}s", config.politeness.max_crawl_delay_secs);
    println!(
        "  Timeouts: connect {}s, request {}s",
        config.politeness.connect_timeout_secs, config.politeness.request_timeout_secs
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nArchive:");
    println!("  Directory: {}", config.archive.directory);
    println!("  Pages per file: {}", config.archive.pages_per_file);
    println!("  Store cleaned html: {}", config.archive.store_cleaned);

    println!("\nLogging:");
    if config.logging.debug {
        println!("  Page log: {}", config.logging.page_log_path);
    } else {
        println!("  Page log: disabled");
    }
    match &config.logging.error_log_path {
        Some(path) => println!("  Error log: {}", path),
        None => println!("  Error log: disabled"),
    }

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", seeds.len());
}
