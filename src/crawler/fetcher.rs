//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - Consulting the politeness gate and honoring its spacing
//! - Classifying responses into fetched pages, refusals and failures

use crate::config::Config;
use crate::crawler::gate::PolitenessGate;
use crate::state::StopSignal;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,
    /// Final URL after redirects
    pub final_url: Url,
    pub status: u16,
    pub body: String,
    /// Response headers; repeated headers are joined with `", "`
    pub headers: BTreeMap<String, String>,
    pub fetched_at: DateTime<Utc>,
}

/// Why a fetch produced no page
///
/// These are expected outcomes of crawling the open web; the worker skips the
/// URL and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("not HTML (content-type: {0:?})")]
    ContentType(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchedPage),
    /// robots.txt disallows the URL; not an error
    Refused,
    Failed(FetchFailure),
    /// The stop signal was set before the request went out
    Cancelled,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.politeness.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.politeness.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages through the politeness gate
///
/// Holds the long-lived client whose connection pool is reused across calls.
/// [`Fetcher::close`] ends its lifetime; later fetches fail without touching
/// the network. Once the stop signal is set, no new request is sent.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    gate: Arc<PolitenessGate>,
    stop: StopSignal,
    closed: AtomicBool,
}

impl Fetcher {
    pub fn new(client: Client, gate: Arc<PolitenessGate>) -> Self {
        Self {
            client,
            gate,
            stop: StopSignal::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Shares an existing stop signal instead of the fetcher's own
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// The signal that cancels pending politeness waits
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn gate(&self) -> &PolitenessGate {
        &self.gate
    }

    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Ask the gate; a disallowed URL returns `Refused`
    /// 2. Reserve the origin's next request slot and sleep until it opens;
    ///    a stop during the wait returns `Cancelled` without any request
    /// 3. GET the URL (redirects followed by the client)
    /// 4. Record the fetch time against the origin
    /// 5. Classify: non-2xx, network errors and non-HTML bodies are `Failed`
    ///
    /// No retries: a failed URL is abandoned.
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        if self.is_closed() {
            return FetchOutcome::Failed(FetchFailure::Request("fetcher closed".to_string()));
        }
        if self.stop.is_set() {
            return FetchOutcome::Cancelled;
        }

        let decision = self.gate.authorize(url).await;
        if !decision.allowed {
            tracing::debug!("Disallowed by robots.txt: {}", url);
            return FetchOutcome::Refused;
        }

        let wait = self.gate.reserve(url, decision.wait);
        if !wait.is_zero() {
            tracing::trace!("Waiting {:?} before {}", wait, url);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.stop.stopped() => {
                    tracing::debug!("Stopped while waiting to fetch {}", url);
                    return FetchOutcome::Cancelled;
                }
            }
        } else if self.stop.is_set() {
            return FetchOutcome::Cancelled;
        }

        let result = self.client.get(url.clone()).send().await;
        self.gate.record_fetch(url, Utc::now());

        let response = match result {
            Ok(response) => response,
            Err(e) => return FetchOutcome::Failed(classify_error(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchOutcome::Failed(FetchFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !is_html(&content_type) {
            return FetchOutcome::Failed(FetchFailure::ContentType(content_type));
        }

        let final_url = response.url().clone();
        let headers = flatten_headers(response.headers());

        match response.text().await {
            Ok(body) => FetchOutcome::Fetched(FetchedPage {
                url: url.clone(),
                final_url,
                status: status.as_u16(),
                body,
                headers,
                fetched_at: Utc::now(),
            }),
            Err(e) if e.is_timeout() => FetchOutcome::Failed(FetchFailure::Timeout),
            Err(e) => FetchOutcome::Failed(FetchFailure::Body(e.to_string())),
        }
    }

    /// Releases the client; called once at shutdown
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Fetcher closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else {
        FetchFailure::Request(e.to_string())
    }
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    map
}
