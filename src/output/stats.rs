//! Crawl report
//!
//! This module provides the end-of-run summary returned by the orchestrator
//! and its console rendering.

use crate::output::faults::WorkerFault;
use crate::state::StopReason;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Pages successfully archived (never more than the budget)
    pub pages_stored: u64,

    /// URLs skipped because robots.txt disallowed them
    pub refused: u64,

    /// URLs abandoned after a failed fetch
    pub failed: u64,

    /// Distinct normalized URLs ever enqueued
    pub urls_discovered: usize,

    /// Workers that ended early, with the URL they were processing
    pub faults: Vec<WorkerFault>,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

impl CrawlReport {
    /// Average archive rate over the whole run
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_stored as f64 / secs
        } else {
            0.0
        }
    }
}

/// Prints the report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Stopped:          {}", report.stop_reason);
    println!("Elapsed:          {:.1}s", report.elapsed.as_secs_f64());
    println!("Pages stored:     {}", report.pages_stored);
    println!("URLs discovered:  {}", report.urls_discovered);
    println!("Refused (robots): {}", report.refused);
    println!("Failed fetches:   {}", report.failed);
    println!("Rate:             {:.2} pages/sec", report.pages_per_second());

    if !report.faults.is_empty() {
        println!("\nWorker faults:");
        for fault in &report.faults {
            println!(
                "  worker {} on {}: {}",
                fault.worker_id,
                fault.url.as_deref().unwrap_or("-"),
                fault.message
            );
        }
    }
}
