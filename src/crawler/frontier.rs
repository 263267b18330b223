//! URL frontier: the visited set and the breadth-first pending queue
//!
//! All state lives behind one mutex so that "check visited, then insert" is a
//! single step. The lock is never held across an await point; waiters park on
//! a [`Notify`] instead.

use crate::url::normalize_url;
use std::collections::{HashSet, VecDeque};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use url::Url;

/// A normalized URL waiting to be fetched, with its discovery depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

#[derive(Debug, Default)]
struct FrontierState {
    /// Every normalized URL ever enqueued; never shrinks
    visited: HashSet<String>,
    pending: VecDeque<FrontierEntry>,
    /// Entries handed out by `next` whose claim has not been dropped yet
    in_progress: usize,
}

/// Shared crawl frontier
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    available: Notify,
    max_depth: Option<u32>,
}

/// An entry handed out by [`Frontier::next`]
///
/// The frontier counts the entry as in progress until the claim is dropped,
/// which is what lets an idle worker tell "empty for now" from "drained".
#[derive(Debug)]
pub struct Claim<'a> {
    frontier: &'a Frontier,
    entry: FrontierEntry,
}

impl Deref for Claim<'_> {
    type Target = FrontierEntry;

    fn deref(&self) -> &FrontierEntry {
        &self.entry
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut state = self.frontier.lock();
        state.in_progress = state.in_progress.saturating_sub(1);
    }
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// `max_depth` of `None` means discovery depth is unbounded.
    pub fn new(max_depth: Option<u32>) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            available: Notify::new(),
            max_depth,
        }
    }

    /// Creates a frontier seeded at depth 0
    pub fn with_seeds<I, S>(seeds: I, max_depth: Option<u32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let frontier = Self::new(max_depth);
        for seed in seeds {
            frontier.add(seed.as_ref(), 0);
        }
        frontier
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a URL discovered at `depth`
    ///
    /// Silently drops URLs that do not normalize (no host, non-http scheme)
    /// and URLs deeper than the configured maximum. Adding an already-visited
    /// URL is a no-op.
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly enqueued
    pub fn add(&self, url: &str, depth: u32) -> bool {
        if self.max_depth.is_some_and(|max| depth > max) {
            tracing::trace!("Dropping {} at depth {} (over limit)", url, depth);
            return false;
        }

        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::trace!("Dropping {}: {}", url, e);
                return false;
            }
        };

        {
            let mut state = self.lock();
            if !state.visited.insert(normalized.as_str().to_string()) {
                return false;
            }
            state.pending.push_back(FrontierEntry {
                url: normalized,
                depth,
            });
        }

        self.available.notify_one();
        true
    }

    /// Takes the oldest pending entry, waiting at most `timeout` for one
    ///
    /// Returns `None` if nothing became available in time.
    pub async fn next(&self, timeout: Duration) -> Option<Claim<'_>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(entry) = state.pending.pop_front() {
                    state.in_progress += 1;
                    return Some(Claim {
                        frontier: self,
                        entry,
                    });
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return None;
            }
        }
    }

    /// Best-effort check for pending entries; racy under concurrency
    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// True when nothing is pending and no claimed entry is still being processed
    ///
    /// Once drained, no worker can add more links, so the frontier stays empty.
    pub fn is_drained(&self) -> bool {
        let state = self.lock();
        state.pending.is_empty() && state.in_progress == 0
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of distinct normalized URLs ever enqueued
    pub fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    pub fn in_progress(&self) -> usize {
        self.lock().in_progress
    }
}
