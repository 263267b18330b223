//! Worker fault records
//!
//! A fault is whatever ended a worker early: a panic or an error in the page
//! processing path. Each one is kept for the crawl report, logged, and
//! optionally appended to an error log file.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// One worker fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFault {
    pub worker_id: usize,
    /// The URL being processed, if the fault happened while holding one
    pub url: Option<String>,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl WorkerFault {
    /// Tab-separated line used in the error log file
    pub fn to_line(&self) -> String {
        format!(
            "{}\tworker {}\t{}\t{}",
            self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.worker_id,
            self.url.as_deref().unwrap_or("-"),
            self.message.replace('\n', " ")
        )
    }
}

#[derive(Debug)]
pub struct FaultLog {
    path: Option<PathBuf>,
    faults: Mutex<Vec<WorkerFault>>,
}

impl FaultLog {
    /// Creates a fault log, appending to `path` when given
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Records a fault
    ///
    /// A failure to write the error log file is reported through tracing and
    /// otherwise ignored; the fault is still kept in memory.
    pub fn record(&self, worker_id: usize, url: Option<&str>, message: &str) {
        let fault = WorkerFault {
            worker_id,
            url: url.map(str::to_string),
            message: message.to_string(),
            at: Utc::now(),
        };

        tracing::error!(
            worker = worker_id,
            url = fault.url.as_deref().unwrap_or("-"),
            "Worker fault: {}",
            fault.message
        );

        if let Some(path) = &self.path {
            if let Err(e) = append_line(path, &fault.to_line()) {
                tracing::warn!("Failed to write error log {}: {}", path.display(), e);
            }
        }

        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fault);
    }

    /// Snapshot of all recorded faults
    pub fn faults(&self) -> Vec<WorkerFault> {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)
}
