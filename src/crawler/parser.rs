//! HTML extraction for fetched pages
//!
//! This module handles parsing HTML content to extract:
//! - Links to follow (raw `href` values, resolved later by the caller)
//! - Page title and a short text excerpt
//! - A cleaned copy of the markup without scripts and styles

use scraper::{ElementRef, Html, Selector};

/// Default length of the text excerpt, in characters
pub const DEFAULT_EXCERPT_CHARS: usize = 300;

/// Tags whose content is never visible text
const HIDDEN_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Information extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Link targets as written in the page, minus non-navigational ones
    pub links: Vec<String>,
    /// Trimmed `<title>` text, empty if absent
    pub title: String,
    /// Whitespace-collapsed visible text, truncated
    pub excerpt: String,
    /// The document re-serialized without `script`, `style` and `noscript`
    pub cleaned_html: String,
}

/// Turns a page body into links and metadata
///
/// Implementations must be pure and must tolerate malformed markup.
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractedPage;
}

/// [`Extractor`] backed by the `scraper` HTML parser
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    excerpt_chars: usize,
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXCERPT_CHARS)
    }
}

impl HtmlExtractor {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }
}

impl Extractor for HtmlExtractor {
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` anywhere in the document
    /// - `<link rel="canonical" href="...">`
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - `javascript:`, `mailto:`, `tel:` links
    /// - Data URIs
    /// - Fragment-only links
    fn extract(&self, html: &str) -> ExtractedPage {
        let mut document = Html::parse_document(html);

        let title = extract_title(&document);
        let links = extract_links(&document);
        let excerpt = visible_text(&document)
            .chars()
            .take(self.excerpt_chars)
            .collect();

        strip_hidden(&mut document);

        ExtractedPage {
            links,
            title,
            excerpt,
            cleaned_html: document.html(),
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn extract_title(document: &Html) -> String {
    let Some(title_selector) = selector("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    if let Some(a_selector) = selector("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href").and_then(keep_href) {
                links.push(href);
            }
        }
    }

    if let Some(canonical_selector) = selector("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href").and_then(keep_href) {
                links.push(href);
            }
        }
    }

    links
}

/// Returns the trimmed href if it can lead to another page
fn keep_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    Some(href.to_string())
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    HIDDEN_TAGS.contains(&element.value().name())
}

fn visible_text(document: &Html) -> String {
    let root = selector("body")
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut words: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(is_hidden);
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

fn strip_hidden(document: &mut Html) {
    let Some(hidden_selector) = selector(&HIDDEN_TAGS.join(", ")) else {
        return;
    };

    let ids: Vec<_> = document.select(&hidden_selector).map(|e| e.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}
