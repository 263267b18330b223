//! Robots.txt handling module
//!
//! This module provides fetching and parsing of robots.txt files. Caching is
//! owned by the politeness gate, which calls [`fetch_robots`] at most once per
//! origin.

mod parser;

pub use parser::ParsedRobots;

use crate::url::robots_url;
use reqwest::Client;

/// Fetches and parses robots.txt for an origin
///
/// Never fails: a network error, a non-success status or an undecodable body
/// all resolve to [`ParsedRobots::allow_all`].
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `origin` - The origin, e.g. `https://example.com`
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let Some(url) = robots_url(origin) else {
        tracing::debug!("Cannot build robots.txt URL for {}", origin);
        return ParsedRobots::allow_all();
    };

    tracing::debug!("Fetching robots.txt: {}", url);

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unavailable for {}: {}", origin, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt for {} returned HTTP {}, allowing all",
            origin,
            response.status()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::debug!("Failed to read robots.txt body for {}: {}", origin, e);
            ParsedRobots::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_robots_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
            )
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &server.uri()).await;
        assert!(!robots.is_permissive());
        assert!(!robots.is_allowed(&format!("{}/private/x", server.uri()), "TestBot"));
    }

    #[tokio::test]
    async fn test_fetch_robots_missing_is_permissive() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let robots = fetch_robots(&Client::new(), &server.uri()).await;
        assert!(robots.is_permissive());
    }

    #[tokio::test]
    async fn test_fetch_robots_unreachable_is_permissive() {
        // Port 9 (discard) on localhost is not expected to accept connections
        let robots = fetch_robots(&Client::new(), "http://127.0.0.1:9").await;
        assert!(robots.is_permissive());
    }
}
