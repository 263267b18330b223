use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Ripple-Crawl
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub politeness: PolitenessConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    pub workers: usize,

    /// Maximum depth to crawl from seed URLs (absent = unbounded)
    #[serde(rename = "max-depth")]
    pub max_depth: Option<u32>,

    /// Maximum number of pages stored in one run
    #[serde(rename = "page-budget")]
    pub page_budget: u64,

    /// How long an idle worker waits on the frontier before re-checking (milliseconds)
    #[serde(rename = "dequeue-timeout-ms")]
    pub dequeue_timeout_ms: u64,

    /// Consecutive empty dequeues after which a worker gives up
    #[serde(rename = "max-empty-retries")]
    pub max_empty_retries: u32,
}

impl CrawlerConfig {
    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            max_depth: None,
            page_budget: 100,
            dequeue_timeout_ms: 1000,
            max_empty_retries: 5,
        }
    }
}

/// Politeness and network timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// Delay between requests to one domain when robots.txt declares none (milliseconds)
    #[serde(rename = "default-delay-ms")]
    pub default_delay_ms: u64,

    /// Upper bound applied to a robots.txt crawl-delay (seconds)
    #[serde(rename = "max-crawl-delay-secs")]
    pub max_crawl_delay_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout, including body read (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl PolitenessConfig {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_delay_ms)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_secs(self.max_crawl_delay_secs)
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: 100,
            max_crawl_delay_secs: 60,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler; also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleCrawl".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/ripple-crawl".to_string(),
        }
    }
}

/// Archive (WARC) output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory receiving `file_<n>.warc` segments
    pub directory: String,

    /// Records per segment before rotating to the next file
    #[serde(rename = "pages-per-file")]
    pub pages_per_file: u32,

    /// Archive the extractor's cleaned html instead of the raw body
    #[serde(rename = "store-cleaned")]
    pub store_cleaned: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            directory: "./corpus".to_string(),
            pages_per_file: 100,
            store_cleaned: false,
        }
    }
}

/// Telemetry and error log configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enables the JSON page log
    pub debug: bool,

    /// Path of the JSON page log
    #[serde(rename = "page-log-path")]
    pub page_log_path: String,

    /// How long the page log batches entries before writing (milliseconds)
    #[serde(rename = "flush-interval-ms")]
    pub flush_interval_ms: u64,

    /// File receiving one line per worker fault
    #[serde(rename = "error-log-path")]
    pub error_log_path: Option<String>,
}

impl LoggingConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            page_log_path: "log.json".to_string(),
            flush_interval_ms: 1000,
            error_log_path: Some("errors.log".to_string()),
        }
    }
}
