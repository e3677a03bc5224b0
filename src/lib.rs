//! Website Checker: crawl a site and audit every page
//!
//! This crate crawls the internal page graph of a domain, records the network
//! traffic of every page, runs rule checks against each page and aggregates the
//! per-page results into a site-wide report.

pub mod analyze;
pub mod config;
pub mod crawler;
pub mod page;
pub mod report;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Website Checker operations
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Cookie database error: {0}")]
    CookieDatabase(#[from] analyze::checks::CookieDatabaseError),

    #[error("Check aborted on {url}")]
    CheckPanicked { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),

    #[error("Cannot resolve link '{link}' against '{base}'")]
    Unresolvable { link: String, base: String },
}

/// Result type alias for Website Checker operations
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analyze::{Analyzer, CheckResult, PageEvaluation, Status};
pub use config::Config;
pub use crawler::{Crawler, HttpFetcher, PageFetcher};
pub use page::{Cookie, Page, Resource, ResourceRequest};
pub use report::{build_report, ReportData};
pub use state::FetchState;
pub use url::{base_domain, is_internal, normalize};
