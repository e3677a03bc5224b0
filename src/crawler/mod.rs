//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - The page fetcher seam and its HTTP implementation
//! - Network capture of one navigation at a time
//! - HTML parsing and link extraction
//! - The frontier of pending URLs
//! - Favicon probing
//! - The traversal state machine and the crawl driver

mod capture;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod probe;

pub use capture::{CapturedTraffic, NetworkCapture, NetworkEvent, DEFAULT_CAPTURE_CAPACITY};
pub use coordinator::{run_crawl, CrawlOutcome, Crawler, RunStorage, Visit};
pub use fetcher::{
    build_http_client, is_html, parse_cookie_header, FetchError, HttpFetcher, LoadedPage,
    PageFetcher,
};
pub use frontier::{filter_candidates, link_already_visited, Frontier, VisitedSet};
pub use parser::{extract_icon_links, parse_html, ParsedPage};
pub use probe::{reconcile_favicon, FaviconProbe, ProbeOutcome};
