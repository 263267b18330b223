//! Output module for crawl telemetry and reports
//!
//! This module handles:
//! - The batched JSON page log (debug mode only)
//! - Recording worker faults
//! - The end-of-run crawl report

mod faults;
mod page_log;
pub mod stats;

pub use faults::{FaultLog, WorkerFault};
pub use page_log::{PageLog, PageLogEntry};
pub use stats::{print_report, CrawlReport};

use thiserror::Error;

/// Errors from the telemetry writers
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Log writer task failed: {0}")]
    Join(String),
}
