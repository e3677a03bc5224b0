//! Configuration module for Website Checker
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every value has a default, so the crawler also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use website_checker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("website-checker.toml")).unwrap();
//! println!("Crawl at most {:?} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ChecksConfig, Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{config_hash, load_config, load_config_or_default, load_config_with_hash, parse_config};
pub use validation::{validate, validate_start_url};
