//! Configuration module for Ripple-Crawl
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and loading the seed URL list.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawl::config::{load_config, load_seeds};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! let seeds = load_seeds(Path::new("seeds.txt")).unwrap();
//! println!("{} seeds, {} workers", seeds.len(), config.crawler.workers);
//! ```

mod parser;
mod seeds;
mod types;
mod validation;

pub use types::{
    ArchiveConfig, Config, CrawlerConfig, LoggingConfig, PolitenessConfig, UserAgentConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use seeds::{load_seeds, parse_seeds};
pub use validation::validate;
