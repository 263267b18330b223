//! Crawl orchestration: the worker pool and its shared state
//!
//! This module ties the crawl together:
//! - One frontier, fetcher, store, page log and fault log shared by all workers
//! - A page budget spent only on successful stores
//! - A stop signal set when the budget runs out or the frontier drains
//! - Per-worker fault isolation: a panic or error ends only that worker

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::gate::PolitenessGate;
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::output::{CrawlReport, FaultLog, PageLog};
use crate::state::{CrawlBudget, Spend, StopReason, StopSignal, WorkerState};
use crate::storage::{PageStore, WarcStore};
use crate::CrawlError;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Per-worker loop settings
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Bounded wait on the frontier before the worker re-checks the stop signal
    pub dequeue_timeout: Duration,
    /// Consecutive empty dequeues after which a worker stops
    pub max_empty_retries: u32,
    /// Archive the cleaned html instead of the raw body
    pub store_cleaned: bool,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            dequeue_timeout: config.crawler.dequeue_timeout(),
            max_empty_retries: config.crawler.max_empty_retries,
            store_cleaned: config.archive.store_cleaned,
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Owns every long-lived crawl resource until [`Orchestrator::run`] releases them
pub struct Orchestrator {
    frontier: Frontier,
    fetcher: Fetcher,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn PageStore>,
    page_log: PageLog,
    faults: FaultLog,
    settings: CrawlSettings,
}

impl Orchestrator {
    /// Creates an orchestrator with the HTML extractor, no page log and an
    /// in-memory fault log
    pub fn new(
        frontier: Frontier,
        fetcher: Fetcher,
        store: Arc<dyn PageStore>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            frontier,
            fetcher,
            extractor: Arc::new(HtmlExtractor::default()),
            store,
            page_log: PageLog::disabled(),
            faults: FaultLog::in_memory(),
            settings,
        }
    }

    /// Builds the full production pipeline from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `seeds` - Seed URLs, enqueued at depth 0
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client or page log could not be created
    pub fn from_config<S: AsRef<str>>(config: &Config, seeds: &[S]) -> Result<Self, CrawlError> {
        let client = build_http_client(config)?;
        let gate = Arc::new(PolitenessGate::new(
            client.clone(),
            &config.politeness,
            &config.user_agent.crawler_name,
        ));
        let fetcher = Fetcher::new(client, gate);
        let frontier = Frontier::with_seeds(seeds, config.crawler.max_depth);
        let store = Arc::new(WarcStore::new(
            &config.archive.directory,
            config.archive.pages_per_file,
        ));

        let page_log = PageLog::from_config(&config.logging)?;
        let faults = FaultLog::new(config.logging.error_log_path.as_ref().map(PathBuf::from));

        Ok(Self::new(frontier, fetcher, store, CrawlSettings::from_config(config))
            .with_page_log(page_log)
            .with_fault_log(faults))
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_page_log(mut self, page_log: PageLog) -> Self {
        self.page_log = page_log;
        self
    }

    pub fn with_fault_log(mut self, faults: FaultLog) -> Self {
        self.faults = faults;
        self
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Runs the crawl to completion
    ///
    /// Spawns `worker_count` workers and returns once every one of them has
    /// stopped. The store, page log and fetcher are then released exactly
    /// once, in that order, even if a worker faulted.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Counts, faults and the reason the crawl ended
    /// * `Err(CrawlError)` - Releasing the store or page log failed
    pub async fn run(self, worker_count: usize, budget: u64) -> Result<CrawlReport, CrawlError> {
        let started = Instant::now();
        let Self {
            frontier,
            fetcher,
            extractor,
            store,
            page_log,
            faults,
            settings,
        } = self;

        let stop = fetcher.stop_signal().clone();
        let ctx = Arc::new(CrawlContext {
            frontier,
            fetcher,
            extractor,
            store,
            page_log,
            faults,
            settings,
            budget: CrawlBudget::new(budget),
            stop,
            refused: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        });

        if ctx.budget.is_exhausted() {
            ctx.stop.stop(StopReason::BudgetExhausted);
        }

        tracing::info!(
            "Starting crawl: {} workers, budget {}, {} seed URLs",
            worker_count,
            budget,
            ctx.frontier.len()
        );

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let worker = Worker::new(id, Arc::clone(&ctx));
            workers.spawn(worker.run());
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(exit) => tracing::debug!("Worker exited: {:?}", exit),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }

        let store_finished = ctx.store.finish();
        let log_finished = ctx.page_log.end_log().await;
        ctx.fetcher.close();
        store_finished?;
        log_finished?;

        let stop_reason = ctx.stop.reason().unwrap_or(if ctx.frontier.is_drained() {
            StopReason::FrontierDrained
        } else {
            StopReason::WorkersExhausted
        });

        let report = CrawlReport {
            pages_stored: ctx.budget.spent(),
            refused: ctx.refused.load(Ordering::Relaxed),
            failed: ctx.failed.load(Ordering::Relaxed),
            urls_discovered: ctx.frontier.visited_count(),
            faults: ctx.faults.faults(),
            stop_reason,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawl finished ({}): {} pages stored in {:?}",
            report.stop_reason,
            report.pages_stored,
            report.elapsed
        );

        Ok(report)
    }
}

/// State shared by every worker of one run
struct CrawlContext {
    frontier: Frontier,
    fetcher: Fetcher,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn PageStore>,
    page_log: PageLog,
    faults: FaultLog,
    settings: CrawlSettings,
    budget: CrawlBudget,
    stop: StopSignal,
    refused: AtomicU64,
    failed: AtomicU64,
}

/// How a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    /// Observed the stop signal
    Stopped,
    /// Hit the empty-retry limit
    GaveUp,
    /// Recorded a fault and stopped
    Faulted,
}

enum Step {
    Continue,
    Exit(WorkerExit),
}

/// A failure that ends one worker
struct Fault {
    url: Option<String>,
    message: String,
}

impl From<CrawlError> for Fault {
    fn from(e: CrawlError) -> Self {
        Self {
            url: None,
            message: e.to_string(),
        }
    }
}

struct Worker {
    id: usize,
    state: WorkerState,
    empty_retries: u32,
    ctx: Arc<CrawlContext>,
}

impl Worker {
    fn new(id: usize, ctx: Arc<CrawlContext>) -> Self {
        Self {
            id,
            state: WorkerState::Idle,
            empty_retries: 0,
            ctx,
        }
    }

    fn enter(&mut self, next: WorkerState) -> Result<(), CrawlError> {
        self.state = self.state.transition(next)?;
        Ok(())
    }

    async fn run(mut self) -> WorkerExit {
        tracing::debug!("Worker {} started", self.id);

        let exit = loop {
            match self.step().await {
                Ok(Step::Continue) => {}
                Ok(Step::Exit(exit)) => break exit,
                Err(fault) => {
                    self.ctx
                        .faults
                        .record(self.id, fault.url.as_deref(), &fault.message);
                    break WorkerExit::Faulted;
                }
            }
        };

        self.state = WorkerState::Stopped;
        tracing::debug!("Worker {} {} ({:?})", self.id, self.state, exit);
        exit
    }

    /// One pass of the loop: dequeue, fetch, process
    async fn step(&mut self) -> Result<Step, Fault> {
        let ctx = Arc::clone(&self.ctx);

        if ctx.stop.is_set() {
            return Ok(Step::Exit(WorkerExit::Stopped));
        }
        if ctx.budget.is_exhausted() {
            ctx.stop.stop(StopReason::BudgetExhausted);
            return Ok(Step::Exit(WorkerExit::Stopped));
        }

        self.enter(WorkerState::Dequeuing)?;
        let Some(claim) = ctx.frontier.next(ctx.settings.dequeue_timeout).await else {
            self.enter(WorkerState::Idle)?;

            if ctx.frontier.is_drained() {
                ctx.stop.stop(StopReason::FrontierDrained);
                return Ok(Step::Exit(WorkerExit::Stopped));
            }

            self.empty_retries += 1;
            if self.empty_retries >= ctx.settings.max_empty_retries {
                tracing::debug!(
                    "Worker {} giving up after {} empty dequeues",
                    self.id,
                    self.empty_retries
                );
                return Ok(Step::Exit(WorkerExit::GaveUp));
            }
            return Ok(Step::Continue);
        };

        self.empty_retries = 0;
        self.enter(WorkerState::Fetching)?;

        let entry: &FrontierEntry = &claim;
        let result = AssertUnwindSafe(self.process(entry))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => Ok(Step::Continue),
            Ok(Err(e)) => Err(Fault {
                url: Some(entry.url.to_string()),
                message: e.to_string(),
            }),
            Err(panic) => Err(Fault {
                url: Some(entry.url.to_string()),
                message: format!("panicked: {}", panic_message(&panic)),
            }),
        }
    }

    /// Fetches one URL and hands the page to the extractor, store, log and frontier
    async fn process(&mut self, entry: &FrontierEntry) -> Result<(), CrawlError> {
        let ctx = Arc::clone(&self.ctx);
        let outcome = ctx.fetcher.fetch(&entry.url).await;
        self.enter(WorkerState::Processing)?;

        let page = match outcome {
            FetchOutcome::Fetched(page) => page,
            FetchOutcome::Refused => {
                ctx.refused.fetch_add(1, Ordering::Relaxed);
                tracing::info!("Skipping {} (disallowed by robots.txt)", entry.url);
                return self.enter(WorkerState::Idle);
            }
            FetchOutcome::Failed(failure) => {
                ctx.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Failed to fetch {}: {}", entry.url, failure);
                return self.enter(WorkerState::Idle);
            }
            FetchOutcome::Cancelled => {
                tracing::debug!("Dropping {} after stop", entry.url);
                return self.enter(WorkerState::Idle);
            }
        };

        let extracted = ctx.extractor.extract(&page.body);
        let archived = if ctx.settings.store_cleaned {
            &extracted.cleaned_html
        } else {
            &page.body
        };

        // The store runs under the budget lock: stores are serialized and the
        // file write blocks this runtime thread until it returns.
        let spend = ctx
            .budget
            .try_spend(|| ctx.store.store(entry.url.as_str(), archived, &page.headers))?;

        match spend {
            Spend::Exhausted => {
                tracing::debug!("Budget exhausted, discarding {}", entry.url);
                ctx.stop.stop(StopReason::BudgetExhausted);
                return self.enter(WorkerState::Idle);
            }
            Spend::Spent { remaining, .. } => {
                tracing::debug!("Stored {} ({} pages left)", entry.url, remaining);
                if remaining == 0 {
                    ctx.stop.stop(StopReason::BudgetExhausted);
                }
            }
        }

        ctx.page_log.log(
            entry.url.as_str(),
            &extracted.title,
            &extracted.excerpt,
            page.fetched_at.timestamp(),
        );

        let child_depth = entry.depth.saturating_add(1);
        let mut added = 0usize;
        for href in &extracted.links {
            match page.final_url.join(href) {
                Ok(link) => {
                    if ctx.frontier.add(link.as_str(), child_depth) {
                        added += 1;
                    }
                }
                Err(e) => tracing::trace!("Unresolvable link {:?} on {}: {}", href, entry.url, e),
            }
        }
        tracing::debug!(
            "{}: {} links, {} new at depth {}",
            entry.url,
            extracted.links.len(),
            added,
            child_depth
        );

        self.enter(WorkerState::Idle)
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
