//! Reading the TOML configuration file
//!
//! The file is read once; the run record stores the SHA-256 digest of exactly
//! the text the configuration was parsed from.

use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Parses and validates configuration text
///
/// Sections and keys missing from `content` take their defaults.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Hex-encoded SHA-256 digest of configuration text
pub fn config_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration file together with the digest of its text
///
/// # Returns
///
/// * `Ok((Config, String))` - The validated configuration and its hash
/// * `Err(ConfigError)` - The file could not be read, parsed or validated
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, config_hash(&content)))
}

/// Loads a configuration file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use website_checker::config::load_config;
///
/// let config = load_config(Path::new("website-checker.toml")).unwrap();
/// println!("Rate limit: {}ms", config.crawler.rate_limit_ms);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_hash(path).map(|(config, _)| config)
}

/// Loads the configuration file if one is given, otherwise validated defaults
///
/// # Returns
///
/// * `Ok((Config, Some(hash)))` - Configuration read from `path`
/// * `Ok((Config, None))` - Default configuration, no file given
/// * `Err(ConfigError)` - Failed to load or validate the configuration
pub fn load_config_or_default(path: Option<&Path>) -> Result<(Config, Option<String>), ConfigError> {
    match path {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            Ok((config, Some(hash)))
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok((config, None))
        }
    }
}
