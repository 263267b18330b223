use url::{Origin, Url};

/// Extracts the politeness key of a URL: its origin (`scheme://host[:port]`)
///
/// Default ports are omitted, so `https://example.com:443/a` and
/// `https://example.com/b` share one key. URLs without a host (or with a
/// scheme that has no tuple origin) yield `None`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_crawl::url::extract_origin;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(extract_origin(&url), Some("https://example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_origin(&url), Some("http://127.0.0.1:8080".to_string()));
/// ```
pub fn extract_origin(url: &Url) -> Option<String> {
    match url.origin() {
        origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
        Origin::Opaque(_) => None,
    }
}

/// Builds the robots.txt location for an origin produced by [`extract_origin`]
pub fn robots_url(origin: &str) -> Option<Url> {
    Url::parse(origin).ok()?.join("/robots.txt").ok()
}
