//! Storage module for archiving fetched pages
//!
//! This module handles:
//! - The `PageStore` interface used by crawl workers
//! - WARC segment writing with record-count rotation

mod traits;
mod warc;

pub use traits::{PageStore, StoreError, StoreResult};
pub use warc::{segment_path, WarcStore};
