//! JSON page log written by a background task
//!
//! Workers hand entries to an unbounded channel and never wait on the file.
//! The writer task batches entries for one flush interval, then appends them
//! to a JSON array. [`PageLog::end_log`] closes the channel, lets the task
//! drain what is left and terminates the array.

use crate::config::LoggingConfig;
use crate::output::OutputError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One page log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLogEntry {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Text")]
    pub text: String,
    /// Fetch time, seconds since the Unix epoch
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
}

type WriterTask = JoinHandle<Result<(), OutputError>>;

/// Fire-and-forget page telemetry; a no-op when disabled
#[derive(Debug)]
pub struct PageLog {
    sender: Mutex<Option<mpsc::UnboundedSender<PageLogEntry>>>,
    task: Mutex<Option<WriterTask>>,
    path: Option<PathBuf>,
}

impl PageLog {
    /// A log that ignores every call
    pub fn disabled() -> Self {
        Self {
            sender: Mutex::new(None),
            task: Mutex::new(None),
            path: None,
        }
    }

    /// Starts the writer task; the file is truncated and opened with `[`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(path: impl Into<PathBuf>, flush_interval: Duration) -> Result<Self, OutputError> {
        let path = path.into();
        std::fs::write(&path, "[")?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_loop(path.clone(), receiver, flush_interval));

        tracing::debug!("Page log started at {}", path.display());
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            task: Mutex::new(Some(task)),
            path: Some(path),
        })
    }

    /// Starts the log when `debug` is on, otherwise returns a disabled log
    pub fn from_config(config: &LoggingConfig) -> Result<Self, OutputError> {
        if config.debug {
            Self::start(&config.page_log_path, config.flush_interval())
        } else {
            Ok(Self::disabled())
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Queues an entry; never blocks
    pub fn log(&self, url: &str, title: &str, text: &str, timestamp: i64) {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = sender.as_ref() {
            let entry = PageLogEntry {
                url: url.to_string(),
                title: title.to_string(),
                text: text.to_string(),
                timestamp,
            };
            if sender.send(entry).is_err() {
                tracing::warn!("Page log writer has stopped; dropping entry for {}", url);
            }
        }
    }

    /// Drains queued entries, closes the JSON array and joins the writer
    ///
    /// Later calls, and calls on a disabled log, do nothing.
    pub async fn end_log(&self) -> Result<(), OutputError> {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match task {
            Some(task) => task.await.map_err(|e| OutputError::Join(e.to_string()))?,
            None => Ok(()),
        }
    }
}

async fn write_loop(
    path: PathBuf,
    mut receiver: mpsc::UnboundedReceiver<PageLogEntry>,
    flush_interval: Duration,
) -> Result<(), OutputError> {
    let mut file = tokio::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .await?;

    let mut buffer: Vec<PageLogEntry> = Vec::new();
    let mut wrote_any = false;
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            entry = receiver.recv() => match entry {
                Some(entry) => buffer.push(entry),
                None => break,
            },
            _ = ticker.tick() => {
                flush(&mut file, &mut buffer, &mut wrote_any).await?;
            }
        }
    }

    flush(&mut file, &mut buffer, &mut wrote_any).await?;
    file.write_all(b"]\n").await?;
    file.flush().await?;
    Ok(())
}

async fn flush(
    file: &mut tokio::fs::File,
    buffer: &mut Vec<PageLogEntry>,
    wrote_any: &mut bool,
) -> Result<(), OutputError> {
    if buffer.is_empty() {
        return Ok(());
    }

    let mut chunk = String::new();
    for entry in buffer.drain(..) {
        if *wrote_any {
            chunk.push_str(",\n");
        }
        chunk.push_str(&serde_json::to_string_pretty(&entry)?);
        *wrote_any = true;
    }

    file.write_all(chunk.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_entries(path: &Path) -> Vec<serde_json::Value> {
        let content = std::fs::read_to_string(path).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[tokio::test]
    async fn test_entries_written_as_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        let log = PageLog::start(&path, Duration::from_millis(10)).unwrap();

        log.log("http://a.test/", "A", "alpha text", 1_700_000_000);
        log.log("http://a.test/b", "B \"quoted\"", "beta", 1_700_000_001);
        log.end_log().await.unwrap();

        let entries = read_entries(&path);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["URL"], "http://a.test/");
        assert_eq!(entries[0]["Title"], "A");
        assert_eq!(entries[0]["Text"], "alpha text");
        assert_eq!(entries[0]["Timestamp"], 1_700_000_000);
        assert_eq!(entries[1]["Title"], "B \"quoted\"");
    }

    #[tokio::test]
    async fn test_empty_log_is_valid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        let log = PageLog::start(&path, Duration::from_millis(10)).unwrap();

        log.end_log().await.unwrap();
        assert!(read_entries(&path).is_empty());
    }

    #[tokio::test]
    async fn test_entries_across_flushes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        let log = PageLog::start(&path, Duration::from_millis(10)).unwrap();

        log.log("http://a.test/1", "", "", 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        log.log("http://a.test/2", "", "", 2);
        log.end_log().await.unwrap();
        log.end_log().await.unwrap();

        assert_eq!(read_entries(&path).len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_log_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = LoggingConfig {
            debug: false,
            page_log_path: dir.path().join("log.json").display().to_string(),
            ..LoggingConfig::default()
        };

        let log = PageLog::from_config(&config).unwrap();
        assert!(!log.is_enabled());
        log.log("http://a.test/", "A", "", 0);
        log.end_log().await.unwrap();

        assert!(!dir.path().join("log.json").exists());
    }
}
