//! Robots.txt parser implementation
//!
//! Allow/disallow matching is delegated to the robotstxt crate; crawl-delay is
//! read with a small group-aware scan since the crate does not expose it.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
///
/// A wrapper around the robotstxt matcher providing a simplified interface for
/// checking URL permissions and reading the crawl delay.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is the cached value when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this policy is the permissive default
    pub fn is_permissive(&self) -> bool {
        self.allow_all || self.content.trim().is_empty()
    }

    /// Checks if a URL is allowed for the given user agent token
    ///
    /// # Arguments
    ///
    /// * `url` - The URL (or path) to check
    /// * `user_agent` - The crawler's product token, e.g. `RippleCrawl`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_permissive() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay in seconds for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group. Within a group the
    /// first valid `Crawl-delay` line counts.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.is_permissive() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut delay_for_agent: Option<f64> = None;
        let mut delay_for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if !delay.is_finite() || delay < 0.0 {
                        continue;
                    }
                    if group
                        .iter()
                        .any(|ua| !ua.is_empty() && ua != "*" && agent.contains(ua.as_str()))
                    {
                        delay_for_agent.get_or_insert(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        delay_for_wildcard.get_or_insert(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        delay_for_agent.or(delay_for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        let robots = ParsedRobots::allow_all();
        assert!(robots.is_permissive());
        assert!(robots.is_allowed("/any/path", "TestBot"));
        assert!(robots.is_allowed("/admin", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_all() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /");
        assert!(!robots.is_allowed("http://a.test/", "TestBot"));
        assert!(!robots.is_allowed("http://a.test/page", "TestBot"));
    }

    #[test]
    fn test_parse_disallow_specific() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /private/");
        assert!(robots.is_allowed("http://a.test/", "TestBot"));
        assert!(robots.is_allowed("http://a.test/public", "TestBot"));
        assert!(!robots.is_allowed("http://a.test/private/page", "TestBot"));
    }

    #[test]
    fn test_parse_allow_and_disallow() {
        let content = "User-agent: *\nDisallow: /private\nAllow: /private/public";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("http://a.test/", "TestBot"));
        assert!(!robots.is_allowed("http://a.test/private", "TestBot"));
        assert!(robots.is_allowed("http://a.test/private/public", "TestBot"));
    }

    #[test]
    fn test_parse_specific_user_agent() {
        let content = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /";
        let robots = ParsedRobots::from_content(content);
        assert!(robots.is_allowed("http://a.test/page", "GoodBot"));
        assert!(!robots.is_allowed("http://a.test/page", "BadBot"));
    }

    #[test]
    fn test_invalid_robots_txt() {
        let robots = ParsedRobots::from_content("This is not valid robots.txt {{{");
        assert!(robots.is_allowed("http://a.test/any/path", "TestBot"));
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_empty_robots_txt() {
        let robots = ParsedRobots::from_content("");
        assert!(robots.is_permissive());
        assert!(robots.is_allowed("http://a.test/any/path", "TestBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(10.0));
        assert_eq!(robots.crawl_delay("AnyBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent() {
        let content = "User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_no_delay() {
        let robots = ParsedRobots::from_content("User-agent: *\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_crawl_delay_decimal() {
        let robots = ParsedRobots::from_content("User-agent: *\nCrawl-delay: 2.5");
        assert_eq!(robots.crawl_delay("TestBot"), Some(2.5));
    }

    #[test]
    fn test_crawl_delay_case_insensitive() {
        let robots = ParsedRobots::from_content("User-agent: TestBot\ncrawl-delay: 7");
        assert_eq!(robots.crawl_delay("testbot"), Some(7.0));
        assert_eq!(robots.crawl_delay("TESTBOT"), Some(7.0));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let robots = ParsedRobots::from_content("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotB"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_group_boundary() {
        // BotB starts a new group after BotA's rules, so BotA gets no delay
        let content = "User-agent: BotA\nDisallow: /x\nUser-agent: BotB\nCrawl-delay: 4";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("BotA"), None);
        assert_eq!(robots.crawl_delay("BotB"), Some(4.0));
    }

    #[test]
    fn test_crawl_delay_ignores_garbage() {
        let content = "User-agent: *\nCrawl-delay: soon\nCrawl-delay: -1 # nope";
        let robots = ParsedRobots::from_content(content);
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }
}
