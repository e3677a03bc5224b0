use serde::Deserialize;

/// Main configuration structure for Website Checker
///
/// Every section is optional in the TOML file; missing values take the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum time between two navigations (milliseconds, 0 = unthrottled)
    #[serde(rename = "rate-limit-ms", default)]
    pub rate_limit_ms: u64,

    /// Maximum number of pages to crawl (absent = unbounded)
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,

    /// Follow links to subdomains of the target domain
    #[serde(rename = "allow-subdomains", default)]
    pub allow_subdomains: bool,

    /// Timeout for loading one page (seconds)
    #[serde(rename = "navigation-timeout-secs", default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,

    /// Timeout for the favicon probe (seconds)
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Load scripts, stylesheets and images referenced by each page
    #[serde(rename = "fetch-subresources", default = "default_true")]
    pub fetch_subresources: bool,

    /// Use a fresh cookie jar for every page
    #[serde(rename = "isolated-sessions", default = "default_true")]
    pub isolated_sessions: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Persist the crawled pages to the SQLite database
    #[serde(rename = "save-pages", default)]
    pub save_pages: bool,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the markdown report file
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,
}

/// Check configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecksConfig {
    /// Open Cookie Database CSV used to describe cookies (absent = cookies stay unknown)
    #[serde(rename = "cookie-database", default)]
    pub cookie_database: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 0,
            max_pages: None,
            allow_subdomains: false,
            navigation_timeout_secs: default_navigation_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            fetch_subresources: true,
            isolated_sessions: true,
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_pages: false,
            database_path: default_database_path(),
            report_path: default_report_path(),
        }
    }
}

fn default_navigation_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_crawler_name() -> String {
    "website-checker".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/website-checker/website-checker".to_string()
}

fn default_database_path() -> String {
    "website-checker.db".to_string()
}

fn default_report_path() -> String {
    "report.md".to_string()
}
