//! WARC archive writer
//!
//! Pages are written as WARC/1.0 `response` records into numbered, gzip
//! compressed segment files (`file_0.warc.gz`, `file_1.warc.gz`, ...). Each
//! record is its own gzip member. A segment is closed after a fixed number of
//! records and the next record opens a new one.

use crate::storage::traits::{PageStore, StoreError, StoreResult};
use chrono::{SecondsFormat, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Headers that describe the wire encoding rather than the archived body
const DROPPED_HEADERS: [&str; 3] = ["content-encoding", "content-length", "transfer-encoding"];

/// Path of segment `index` inside `directory`
pub fn segment_path(directory: &Path, index: u32) -> PathBuf {
    directory.join(format!("file_{}.warc.gz", index))
}

#[derive(Debug, Default)]
struct Segments {
    writer: Option<BufWriter<File>>,
    index: u32,
    records_in_segment: u32,
    records_total: u64,
    finished: bool,
}

/// Thread-safe WARC segment writer
#[derive(Debug)]
pub struct WarcStore {
    directory: PathBuf,
    pages_per_file: u32,
    segments: Mutex<Segments>,
}

impl WarcStore {
    /// Creates a store writing into `directory`
    ///
    /// The directory is created on the first write. A `pages_per_file` of
    /// zero is treated as one.
    pub fn new(directory: impl Into<PathBuf>, pages_per_file: u32) -> Self {
        Self {
            directory: directory.into(),
            pages_per_file: pages_per_file.max(1),
            segments: Mutex::new(Segments::default()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records_total
    }

    fn open_segment(&self, index: u32) -> StoreResult<BufWriter<File>> {
        fs::create_dir_all(&self.directory)?;
        let path = segment_path(&self.directory, index);
        tracing::debug!("Opening WARC segment {}", path.display());

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }
}

impl PageStore for WarcStore {
    fn store(&self, url: &str, html: &str, headers: &BTreeMap<String, String>) -> StoreResult<()> {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        if segments.finished {
            return Err(StoreError::Finished);
        }

        let member = compress_record(&build_record(url, html, headers))?;

        if segments.writer.is_none() {
            segments.writer = Some(self.open_segment(segments.index)?);
        }
        if let Some(writer) = segments.writer.as_mut() {
            writer.write_all(&member)?;
        }

        segments.records_in_segment += 1;
        segments.records_total += 1;

        if segments.records_in_segment >= self.pages_per_file {
            if let Some(mut writer) = segments.writer.take() {
                writer.flush()?;
            }
            segments.index += 1;
            segments.records_in_segment = 0;
        }

        Ok(())
    }

    fn finish(&self) -> StoreResult<()> {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        if segments.finished {
            return Ok(());
        }
        segments.finished = true;

        if let Some(mut writer) = segments.writer.take() {
            writer.flush()?;
        }

        tracing::info!(
            "Archive closed: {} records in {}",
            segments.records_total,
            self.directory.display()
        );
        Ok(())
    }
}

/// Gzips one record into a standalone member
fn compress_record(record: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(record.len() / 2), Compression::default());
    encoder.write_all(record)?;
    encoder.finish()
}

/// Serializes one WARC `response` record whose block is an HTTP/1.0 response
fn build_record(url: &str, html: &str, headers: &BTreeMap<String, String>) -> Vec<u8> {
    let body = html.as_bytes();

    let mut block = Vec::with_capacity(body.len() + 512);
    block.extend_from_slice(b"HTTP/1.0 200 OK\r\n");
    for (name, value) in headers {
        if DROPPED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
            continue;
        }
        block.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    block.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.len()).as_bytes());
    block.extend_from_slice(body);

    let header = format!(
        "WARC/1.0\r\n\
         WARC-Type: response\r\n\
         WARC-Record-ID: <urn:uuid:{}>\r\n\
         WARC-Date: {}\r\n\
         WARC-Target-URI: {}\r\n\
         Content-Type: application/http; msgtype=response\r\n\
         Content-Length: {}\r\n\
         \r\n",
        Uuid::new_v4(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        url,
        block.len()
    );

    let mut record = Vec::with_capacity(header.len() + block.len() + 4);
    record.extend_from_slice(header.as_bytes());
    record.extend_from_slice(&block);
    record.extend_from_slice(b"\r\n\r\n");
    record
}
