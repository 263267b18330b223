//! Politeness gate: per-origin robots.txt caching and request spacing
//!
//! Every origin gets one [`DomainSlot`]. Its robots policy is resolved once
//! through a `OnceCell`, so concurrent first references share a single
//! robots.txt fetch. Its schedule hands out request start times spaced by the
//! crawl delay, which makes the delay a minimum spacing per origin rather than
//! a per-call sleep.

use crate::config::PolitenessConfig;
use crate::robots::{fetch_robots, ParsedRobots};
use crate::state::DomainState;
use crate::url::extract_origin;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use url::Url;

/// Verdict for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether robots.txt permits the crawler to fetch the URL
    pub allowed: bool,
    /// Minimum spacing between requests to the URL's origin
    pub wait: Duration,
}

#[derive(Debug, Default)]
struct DomainSlot {
    robots: OnceCell<ParsedRobots>,
    schedule: Mutex<DomainState>,
}

/// Shared politeness gate
#[derive(Debug)]
pub struct PolitenessGate {
    client: Client,
    agent: String,
    default_delay: Duration,
    max_crawl_delay: Duration,
    domains: Mutex<HashMap<String, Arc<DomainSlot>>>,
    robots_fetches: AtomicUsize,
}

impl PolitenessGate {
    /// Creates a gate
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client used for robots.txt requests
    /// * `config` - Default delay and crawl-delay cap
    /// * `agent` - Product token matched against robots.txt `User-agent` lines
    pub fn new(client: Client, config: &PolitenessConfig, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            default_delay: config.default_delay(),
            max_crawl_delay: config.max_crawl_delay(),
            domains: Mutex::new(HashMap::new()),
            robots_fetches: AtomicUsize::new(0),
        }
    }

    fn slot(&self, origin: &str) -> Arc<DomainSlot> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(domains.entry(origin.to_string()).or_default())
    }

    /// Decides whether `url` may be fetched and what spacing applies to its origin
    ///
    /// The first call for an origin fetches its robots.txt; every later call
    /// reuses the cached policy, including a permissive fallback cached after
    /// a failed fetch.
    pub async fn authorize(&self, url: &Url) -> Decision {
        let Some(origin) = extract_origin(url) else {
            return Decision {
                allowed: true,
                wait: self.default_delay,
            };
        };

        let slot = self.slot(&origin);
        let robots = slot
            .robots
            .get_or_init(|| async {
                self.robots_fetches.fetch_add(1, Ordering::Relaxed);
                fetch_robots(&self.client, &origin).await
            })
            .await;

        let allowed = robots.is_allowed(url.as_str(), &self.agent);
        let wait = match robots.crawl_delay(&self.agent) {
            Some(secs) => Duration::from_secs_f64(secs.min(self.max_crawl_delay.as_secs_f64())),
            None => self.default_delay,
        };

        Decision { allowed, wait }
    }

    /// Reserves the next request start for `url`'s origin
    ///
    /// Returns how long the caller must sleep before sending the request.
    /// URLs without an origin get `spacing` back unchanged.
    pub fn reserve(&self, url: &Url, spacing: Duration) -> Duration {
        let Some(origin) = extract_origin(url) else {
            return spacing;
        };

        let slot = self.slot(&origin);
        let mut schedule = slot.schedule.lock().unwrap_or_else(PoisonError::into_inner);
        schedule.reserve(Instant::now(), spacing)
    }

    /// Records the completion time of a fetch to `url`'s origin
    pub fn record_fetch(&self, url: &Url, at: DateTime<Utc>) {
        if let Some(origin) = extract_origin(url) {
            let slot = self.slot(&origin);
            let mut schedule = slot.schedule.lock().unwrap_or_else(PoisonError::into_inner);
            schedule.record_fetch(at);
        }
    }

    /// Snapshot of an origin's schedule, if the origin has been seen
    pub fn domain_state(&self, origin: &str) -> Option<DomainState> {
        let domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        domains.get(origin).map(|slot| {
            slot.schedule
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Number of robots.txt fetches performed so far
    pub fn robots_fetches(&self) -> usize {
        self.robots_fetches.load(Ordering::Relaxed)
    }

    /// Number of distinct origins seen
    pub fn domain_count(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
