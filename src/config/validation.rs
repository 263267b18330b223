use crate::config::types::{
    ArchiveConfig, Config, CrawlerConfig, LoggingConfig, PolitenessConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_politeness_config(&config.politeness)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_archive_config(&config.archive)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.dequeue_timeout_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "dequeue_timeout_ms must be >= 10ms, got {}ms",
            config.dequeue_timeout_ms
        )));
    }

    if config.max_empty_retries < 1 {
        return Err(ConfigError::Validation(
            "max_empty_retries must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates politeness configuration
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_crawl_delay_secs.saturating_mul(1000) < config.default_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_crawl_delay_secs ({}s) must not be shorter than default_delay_ms ({}ms)",
            config.max_crawl_delay_secs, config.default_delay_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    // The name doubles as the robots.txt product token
    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates archive configuration
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "archive directory cannot be empty".to_string(),
        ));
    }

    if config.pages_per_file < 1 {
        return Err(ConfigError::Validation(
            "pages_per_file must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<(), ConfigError> {
    if config.page_log_path.is_empty() {
        return Err(ConfigError::Validation(
            "page_log_path cannot be empty".to_string(),
        ));
    }

    if config.flush_interval_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "flush_interval_ms must be >= 10ms, got {}ms",
            config.flush_interval_ms
        )));
    }

    if matches!(&config.error_log_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "error_log_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = Config::default();
        config.crawler.workers = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_too_many_workers() {
        let mut config = Config::default();
        config.crawler.workers = MAX_WORKERS + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_dequeue_timeout_too_short() {
        let mut config = Config::default();
        config.crawler.dequeue_timeout_ms = 5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_empty_retries() {
        let mut config = Config::default();
        config.crawler.max_empty_retries = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_page_budget_is_valid() {
        let mut config = Config::default();
        config.crawler.page_budget = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeouts() {
        let mut config = Config::default();
        config.politeness.connect_timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.politeness.request_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawl_delay_cap_below_default() {
        let mut config = Config::default();
        config.politeness.max_crawl_delay_secs = 1;
        config.politeness.default_delay_ms = 2000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "Bad Bot/1".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = Config::default();
        config.user_agent.contact_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_zero_pages_per_file() {
        let mut config = Config::default();
        config.archive.pages_per_file = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_error_log_path() {
        let mut config = Config::default();
        config.logging.error_log_path = Some(String::new());
        assert!(validate(&config).is_err());

        config.logging.error_log_path = None;
        assert!(validate(&config).is_ok());
    }
}
