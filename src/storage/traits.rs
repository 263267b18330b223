//! Storage traits and error types
//!
//! This module defines the trait interface for archive backends and
//! associated error types.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store already finished")]
    Finished,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for archive backends
///
/// Workers call [`PageStore::store`] concurrently, so implementations must
/// synchronize internally.
pub trait PageStore: Send + Sync {
    /// Archives one fetched page
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL
    /// * `html` - The page markup
    /// * `headers` - Response headers
    fn store(&self, url: &str, html: &str, headers: &BTreeMap<String, String>) -> StoreResult<()>;

    /// Flushes and closes the store; later `store` calls fail with `Finished`
    fn finish(&self) -> StoreResult<()>;
}
