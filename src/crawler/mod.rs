//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier (dedup, normalization, depth-bounded queue)
//! - The politeness gate (robots.txt caching, per-origin request spacing)
//! - HTTP fetching and HTML extraction
//! - Overall crawl orchestration across a pool of workers

mod fetcher;
mod frontier;
mod gate;
mod orchestrator;
mod parser;

pub use fetcher::{build_http_client, FetchFailure, FetchOutcome, FetchedPage, Fetcher};
pub use frontier::{Claim, Frontier, FrontierEntry};
pub use gate::{Decision, PolitenessGate};
pub use orchestrator::{CrawlSettings, Orchestrator};
pub use parser::{ExtractedPage, Extractor, HtmlExtractor, DEFAULT_EXCERPT_CHARS};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::CrawlError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client, politeness gate and fetcher
/// 2. Seed the frontier at depth 0
/// 3. Open the WARC store, page log and fault log
/// 4. Run the configured number of workers until the budget is spent or the
///    frontier drains
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seeds` - Seed URLs
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(CrawlError)` - Setup or shutdown failed
pub async fn crawl<S: AsRef<str>>(config: &Config, seeds: &[S]) -> Result<CrawlReport, CrawlError> {
    let orchestrator = Orchestrator::from_config(config, seeds)?;
    orchestrator
        .run(config.crawler.workers, config.crawler.page_budget)
        .await
}
