//! Frontier of discovered but not yet visited URLs
//!
//! The frontier keeps its URLs sorted so that repeated crawls of the same site
//! visit pages in the same order.

use crate::url::{is_internal, strip_trailing_slash};
use std::collections::{BTreeSet, HashSet};

/// File extensions of image resources, which are never crawled as pages
const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".avif"];

/// URLs for which a fetch has been attempted or completed
pub type VisitedSet = HashSet<String>;

/// Sorted set of normalized absolute URLs waiting to be fetched
#[derive(Debug, Default, Clone)]
pub struct Frontier {
    urls: BTreeSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL unless it is already queued or already visited
    ///
    /// # Returns
    ///
    /// * `true` - The URL was inserted
    /// * `false` - The URL was queued or visited before
    pub fn add(&mut self, url: &str, visited: &VisitedSet) -> bool {
        if link_already_visited(url, visited) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    /// Removes and returns the smallest URL, or None once the frontier is exhausted
    pub fn pop_next(&mut self) -> Option<String> {
        self.urls.pop_first()
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns true if no URL is queued
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns true if the URL is queued
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }
}

/// Trailing-slash-insensitive membership test against the visited set
pub fn link_already_visited(url: &str, visited: &VisitedSet) -> bool {
    let bare = strip_trailing_slash(url);
    visited.contains(bare) || visited.contains(&format!("{}/", bare))
}

/// Keeps the discovered links that may enter the frontier
///
/// A link qualifies if it is internal to `domain`, has not been visited and
/// does not point to an image. Duplicates are removed, first occurrence wins.
pub fn filter_candidates(
    discovered_links: &[String],
    visited: &VisitedSet,
    domain: &str,
    allow_subdomain: bool,
) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for url in discovered_links {
        if !is_internal(url, domain, allow_subdomain)
            || link_already_visited(url, visited)
            || is_image(url)
            || candidates.contains(url)
        {
            continue;
        }
        candidates.push(url.clone());
    }

    candidates
}

/// Checks the URL path (query ignored) for an image extension
fn is_image(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
