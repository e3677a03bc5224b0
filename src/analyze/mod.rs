//! Page analysis
//!
//! Runs a static list of rule checks against a crawled [`Page`] and collects
//! the results into a [`PageEvaluation`].

pub mod checks;
mod result;

pub use result::{max_status, CheckResult, PageEvaluation, ResultPayload, Status};

use crate::config::ChecksConfig;
use crate::page::Page;
use crate::analyze::checks::{CookieDatabase, CookieDatabaseError};
use std::path::Path;

/// A rule evaluated against one page
pub trait Check: Send + Sync {
    /// Title shared by every result of this check
    fn title(&self) -> &'static str;

    /// Evaluates the page
    fn check(&self, page: &Page) -> CheckResult;
}

/// Runs registered checks against pages
pub struct Analyzer {
    checks: Vec<Box<dyn Check>>,
}

impl Analyzer {
    /// Creates an analyzer with an explicit list of checks
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// Titles of the registered checks, in run order
    pub fn titles(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.title()).collect()
    }

    /// Evaluates one page with every registered check
    pub fn run(&self, page: &Page) -> PageEvaluation {
        let mut evaluation = PageEvaluation::new(&page.url, &page.title);
        evaluation.screenshot = page.screenshot.clone();
        evaluation.created = page.created;

        for check in &self.checks {
            let result = check.check(page);
            tracing::trace!("{} on {}: {}", result.title, page.url, result.status);
            evaluation.add_result(result);
        }

        evaluation.finalize();
        evaluation
    }
}

impl Analyzer {
    /// Creates the standard analyzer, loading the configured cookie database
    pub fn from_config(config: &ChecksConfig) -> Result<Self, CookieDatabaseError> {
        let cookies = match &config.cookie_database {
            Some(path) => CookieDatabase::load(Path::new(path))?,
            None => CookieDatabase::default(),
        };
        Ok(Self::new(checks::checks_with(cookies)))
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(checks::default_checks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Status);

    impl Check for Fixed {
        fn title(&self) -> &'static str {
            "Fixed"
        }

        fn check(&self, _page: &Page) -> CheckResult {
            CheckResult::text("Fixed", "fixed outcome", self.0)
        }
    }

    #[test]
    fn test_run_collects_results_and_status() {
        let analyzer = Analyzer::new(vec![Box::new(Fixed(Status::Ok)), Box::new(Fixed(Status::Failed))]);
        let mut page = Page::new("https://a.test/");
        page.title = "Home".to_string();

        let evaluation = analyzer.run(&page);
        assert_eq!(evaluation.url, "https://a.test/");
        assert_eq!(evaluation.title, "Home");
        assert_eq!(evaluation.results.len(), 2);
        assert_eq!(evaluation.status, Status::Failed);
        assert_eq!(evaluation.created, page.created);
    }

    #[test]
    fn test_default_analyzer_registers_checks() {
        let analyzer = Analyzer::default();
        let titles = analyzer.titles();
        assert!(titles.contains(&"Cookie without consent"));
        assert!(titles.contains(&"H1 Headings"));
        assert!(titles.contains(&"Detect Page Builder"));
    }

    #[test]
    fn test_from_config_loads_cookie_database() {
        let file = checks::write_cookie_csv();
        let config = ChecksConfig {
            cookie_database: Some(file.path().display().to_string()),
        };
        let analyzer = Analyzer::from_config(&config).unwrap();

        let mut page = Page::new("https://a.test/");
        page.cookies.push(crate::page::Cookie::new("userlang", "de"));
        let evaluation = analyzer.run(&page);

        let cookies = evaluation
            .results
            .iter()
            .find(|r| r.title == "Cookie without consent")
            .unwrap();
        let ResultPayload::Table { rows, .. } = &cookies.payload else {
            panic!("expected a table");
        };
        assert_eq!(rows[0][1], "Cookiebot");
    }

    #[test]
    fn test_from_config_with_missing_database() {
        let config = ChecksConfig {
            cookie_database: Some("/nonexistent/cookies.csv".to_string()),
        };
        assert!(Analyzer::from_config(&config).is_err());
    }
}
