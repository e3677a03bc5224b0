//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Outbound links to follow (from `<a>` tags)
//! - Favicon references (`<link rel="icon">` / `<link rel="shortcut icon">`)
//! - Static sub-resources a browser would load (scripts, stylesheets, images)
//! - Page title
//!
//! All values are returned as written in the document; resolving them is the
//! job of [`crate::url::normalize`].

use scraper::{Html, Selector};

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from `<title>` tag)
    pub title: Option<String>,

    /// Raw `href` values of followable links
    pub links: Vec<String>,

    /// Raw `href` values of icon links
    pub icons: Vec<String>,

    /// Raw `src`/`href` values of scripts, stylesheets and images
    pub subresources: Vec<String>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
///
/// # Example
///
/// ```
/// use website_checker::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
        icons: extract_icons(&document),
        subresources: extract_subresources(&document),
    }
}

/// Extracts just the favicon references from an HTML string
pub fn extract_icon_links(html: &str) -> Vec<String> {
    extract_icons(&Html::parse_document(html))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if is_followable(href) {
                    links.push(href.trim().to_string());
                }
            }
        }
    }

    links
}

/// Extracts the `href` of every `<link rel="icon">` and `<link rel="shortcut icon">`
fn extract_icons(document: &Html) -> Vec<String> {
    let mut icons = Vec::new();

    if let Ok(link_selector) = Selector::parse("link[rel][href]") {
        for element in document.select(&link_selector) {
            let rel = element
                .value()
                .attr("rel")
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if rel != "icon" && rel != "shortcut icon" {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if !href.is_empty() && !href.starts_with("data:") {
                    icons.push(href.to_string());
                }
            }
        }
    }

    icons
}

/// Extracts scripts, stylesheets and images referenced by the document
fn extract_subresources(document: &Html) -> Vec<String> {
    let mut resources = Vec::new();

    for (selector, attr) in [
        ("script[src]", "src"),
        ("link[rel='stylesheet'][href]", "href"),
        ("img[src]", "src"),
    ] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() && !value.starts_with("data:") {
                    resources.push(value.to_string());
                }
            }
        }
    }

    resources
}

/// Returns false for hrefs that never lead to another page
fn is_followable(href: &str) -> bool {
    let href = href.trim();

    // Skip empty hrefs and same page anchors
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    // Skip special schemes
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
