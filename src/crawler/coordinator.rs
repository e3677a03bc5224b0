//! Crawler coordinator - the traversal state machine
//!
//! This module contains the crawl loop that ties everything together:
//! - Taking URLs from the frontier and spacing out navigations
//! - Driving the page fetcher and draining its network capture
//! - Classifying every attempt into a terminal [`FetchState`]
//! - Reconciling favicons with the captured traffic
//! - Feeding discovered links back into the frontier
//!
//! [`Crawler`] is an external iterator: every call to [`Crawler::next_page`]
//! retries past skipped URLs and returns the next successfully loaded page, or
//! None once the frontier is exhausted.

use crate::analyze::{Analyzer, PageEvaluation};
use crate::config::Config;
use crate::crawler::capture::NetworkCapture;
use crate::crawler::fetcher::{LoadedPage, PageFetcher};
use crate::crawler::frontier::{filter_candidates, link_already_visited, Frontier, VisitedSet};
use crate::crawler::parser::parse_html;
use crate::crawler::probe::{reconcile_favicon, FaviconProbe};
use crate::page::Page;
use crate::state::{FetchState, RateLimiter};
use crate::storage::Storage;
use crate::url::{base_domain, is_internal, normalize, same_url};
use crate::CheckerError;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Outcome of one attempted URL
///
/// A visit is recorded as `Fetching` when its navigation starts and moves into
/// a terminal state once the attempt is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    /// The requested URL
    pub url: String,
    pub state: FetchState,

    /// Failure detail or landed URL, for skips
    pub detail: Option<String>,
}

impl Visit {
    /// A visit whose navigation has just started
    fn started(url: &str) -> Self {
        Self {
            url: url.to_string(),
            state: FetchState::Fetching,
            detail: None,
        }
    }
}

/// Domain, start URL and favicon probe of a crawl, resolved before a session is handed over
struct CrawlTarget {
    domain: String,
    start: String,
    probe: FaviconProbe,
}

impl CrawlTarget {
    fn resolve(start_url: &str, config: &Config) -> Result<Self, CheckerError> {
        let domain = base_domain(start_url)?;
        let start = normalize(&domain, start_url, start_url)?;
        let probe = FaviconProbe::new(
            &config.user_agent,
            Duration::from_secs(config.crawler.probe_timeout_secs),
        )?;
        Ok(Self {
            domain,
            start,
            probe,
        })
    }
}

/// Result of a single fetch attempt
enum Attempt {
    Loaded(Box<Page>),
    Skipped { state: FetchState, detail: String },
}

/// One crawl session over a single domain
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
    domain: String,
    allow_subdomains: bool,
    frontier: Frontier,
    visited: VisitedSet,
    capture: NetworkCapture,
    rate_limiter: RateLimiter,
    probe: FaviconProbe,
    visits: Vec<Visit>,
}

impl<F: PageFetcher> Crawler<F> {
    /// Creates a crawler seeded with `start_url`
    ///
    /// # Arguments
    ///
    /// * `start_url` - Absolute URL the crawl starts from; its origin is the audited domain
    /// * `fetcher` - The session used for every navigation
    /// * `config` - Crawler and user agent settings
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to iterate
    /// * `Err(CheckerError)` - The start URL is invalid or the probe client failed to build
    pub fn new(start_url: &str, fetcher: F, config: &Config) -> Result<Self, CheckerError> {
        let target = CrawlTarget::resolve(start_url, config)?;
        Ok(Self::from_target(target, fetcher, config))
    }

    fn from_target(target: CrawlTarget, fetcher: F, config: &Config) -> Self {
        let visited = VisitedSet::new();
        let mut frontier = Frontier::new();
        frontier.add(&target.start, &visited);

        tracing::info!("Crawling {} starting at {}", target.domain, target.start);

        Self {
            fetcher,
            domain: target.domain,
            allow_subdomains: config.crawler.allow_subdomains,
            frontier,
            visited,
            capture: NetworkCapture::default(),
            rate_limiter: RateLimiter::from_millis(config.crawler.rate_limit_ms),
            probe: target.probe,
            visits: Vec::new(),
        }
    }

    /// Replaces the favicon probe
    pub fn with_probe(mut self, probe: FaviconProbe) -> Self {
        self.probe = probe;
        self
    }

    /// The audited origin (scheme + host)
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// URLs for which a fetch has been attempted or completed
    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    /// URLs still waiting to be fetched
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// State of every attempted URL, in attempt order
    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    /// Returns the next successfully loaded page, or None once the frontier is exhausted
    ///
    /// Skipped URLs are logged and recorded in [`Crawler::visits`]; they never
    /// end the iteration.
    pub async fn next_page(&mut self) -> Option<Page> {
        while let Some(url) = self.frontier.pop_next() {
            if link_already_visited(&url, &self.visited) {
                tracing::trace!("Already visited, dropping {}", url);
                continue;
            }

            self.visits.push(Visit::started(&url));

            match self.fetch(&url).await {
                Attempt::Loaded(page) => {
                    tracing::info!("Loaded {} ({} queued)", page.url, self.frontier.len());
                    self.finish_visit(FetchState::Success, None);
                    return Some(*page);
                }
                Attempt::Skipped { state, detail } => {
                    if state == FetchState::SkipNavigationError {
                        tracing::warn!("Skipping {}: {}", url, detail);
                    } else {
                        tracing::debug!("Skipping {} ({}): {}", url, state, detail);
                    }
                    self.finish_visit(state, Some(detail));
                }
            }
        }

        tracing::debug!("Frontier is empty");
        None
    }

    /// Moves the in-flight visit into its terminal state
    fn finish_visit(&mut self, state: FetchState, detail: Option<String>) {
        let Some(visit) = self.visits.last_mut() else {
            return;
        };
        if visit.state.can_transition_to(state) {
            visit.state = state;
            visit.detail = detail;
        } else {
            tracing::warn!(
                "Ignoring transition {} -> {} for {}",
                visit.state,
                state,
                visit.url
            );
        }
    }

    /// Releases the fetch session
    pub async fn close(mut self) -> Result<(), CheckerError> {
        self.fetcher.close().await?;
        Ok(())
    }

    /// Attempts one URL and classifies the outcome
    async fn fetch(&mut self, url: &str) -> Attempt {
        self.capture.reset();
        self.visited.insert(url.to_string());
        self.rate_limiter.wait().await;

        let loaded = match self.fetcher.navigate(url, &mut self.capture).await {
            Ok(loaded) => loaded,
            Err(e) => {
                self.capture.reset();
                return Attempt::Skipped {
                    state: FetchState::SkipNavigationError,
                    detail: e.to_string(),
                };
            }
        };

        if !self.capture.has_responses() {
            let traffic = self.capture.drain();
            for download in &traffic.downloads {
                self.fetcher.cancel_download(download).await;
            }
            return Attempt::Skipped {
                state: FetchState::SkipNoPage,
                detail: match traffic.downloads.first() {
                    Some(download) => format!("download of {}", download.url),
                    None => "no network response".to_string(),
                },
            };
        }

        if !same_url(&loaded.url, url) {
            if !is_internal(&loaded.url, &self.domain, self.allow_subdomains) {
                self.capture.reset();
                return Attempt::Skipped {
                    state: FetchState::SkipExternalRedirect,
                    detail: format!("redirected to {}", loaded.url),
                };
            }
            if link_already_visited(&loaded.url, &self.visited) {
                self.capture.reset();
                return Attempt::Skipped {
                    state: FetchState::SkipAlreadyVisited,
                    detail: format!("redirected to {}", loaded.url),
                };
            }
        }

        self.visited.insert(loaded.url.clone());
        Attempt::Loaded(Box::new(self.build_page(loaded).await))
    }

    /// Turns a loaded document and its captured traffic into a page record
    async fn build_page(&mut self, loaded: LoadedPage) -> Page {
        let mut traffic = self.capture.drain();
        for download in &traffic.downloads {
            self.fetcher.cancel_download(download).await;
        }

        let parsed = parse_html(&loaded.html);

        let mut page = Page::new(loaded.url);
        page.title = loaded.title;
        page.cookies = loaded.cookies;
        page.screenshot = loaded.screenshot;
        page.elements = std::mem::take(&mut traffic.elements);
        page.requests = std::mem::take(&mut traffic.requests);
        page.failed_requests = std::mem::take(&mut traffic.failed_requests);
        page.html = loaded.html;

        for icon in &parsed.icons {
            let Ok(icon_url) = normalize(&self.domain, icon, &page.url) else {
                tracing::debug!("Cannot resolve icon {} on {}", icon, page.url);
                continue;
            };
            if !icon_url.starts_with("http") {
                continue;
            }
            let outcome = self.probe.probe(&icon_url).await;
            reconcile_favicon(&mut page, &icon_url, outcome);
        }

        let mut links: Vec<String> = Vec::new();
        for link in &parsed.links {
            match normalize(&self.domain, link, &page.url) {
                Ok(normalized) => links.push(normalized),
                Err(e) => tracing::debug!("Failed to normalize {}: {}", link, e),
            }
        }

        let candidates = filter_candidates(&links, &self.visited, &self.domain, self.allow_subdomains);
        let mut added = 0;
        for candidate in &candidates {
            if self.frontier.add(candidate, &self.visited) {
                added += 1;
            }
        }
        tracing::debug!(
            "{}: {} links, {} new in frontier",
            page.url,
            links.len(),
            added
        );

        page
    }
}

/// Persistence target for one crawl run
pub struct RunStorage<'a> {
    pub storage: &'a mut dyn Storage,
    pub run_id: i64,
}

/// What a finished crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    /// One evaluation per successfully loaded page, in crawl order
    pub evaluations: Vec<PageEvaluation>,

    /// Terminal state of every attempted URL
    pub visits: Vec<Visit>,
}

impl CrawlOutcome {
    /// Number of attempted URLs that ended in a skip state
    pub fn skipped(&self) -> usize {
        self.visits.iter().filter(|v| v.state.is_skip()).count()
    }
}

/// Runs a complete crawl and evaluates every page
///
/// This function:
/// 1. Creates the crawler for `start_url`, closing `fetcher` if that fails
/// 2. Pulls pages until the frontier is exhausted or `max-pages` is reached
/// 3. Runs the analyzer on each page
/// 4. Persists pages and visit states when a storage target is given
/// 5. Closes the fetcher, whatever the outcome
///
/// # Example
///
/// ```no_run
/// use website_checker::analyze::Analyzer;
/// use website_checker::config::Config;
/// use website_checker::crawler::{run_crawl, HttpFetcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let fetcher = HttpFetcher::new(&config.crawler, &config.user_agent)?;
/// let outcome = run_crawl("https://example.com", &config, fetcher, &Analyzer::default(), None).await?;
/// println!("{} pages", outcome.evaluations.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<F: PageFetcher>(
    start_url: &str,
    config: &Config,
    fetcher: F,
    analyzer: &Analyzer,
    mut storage: Option<RunStorage<'_>>,
) -> Result<CrawlOutcome, CheckerError> {
    let mut fetcher = fetcher;
    let target = match CrawlTarget::resolve(start_url, config) {
        Ok(target) => target,
        Err(e) => {
            if let Err(close_err) = fetcher.close().await {
                tracing::warn!("Failed to close fetch session: {}", close_err);
            }
            return Err(e);
        }
    };
    let mut crawler = Crawler::from_target(target, fetcher, config);
    let max_pages = config.crawler.max_pages.map(|m| m as usize);
    let start_time = std::time::Instant::now();

    let mut evaluations = Vec::new();
    let mut failure: Option<CheckerError> = None;

    while max_pages.map_or(true, |max| evaluations.len() < max) {
        let Some(page) = crawler.next_page().await else {
            break;
        };

        if let Some(target) = storage.as_mut() {
            if let Err(e) = target.storage.save_page(target.run_id, &page) {
                failure = Some(e.into());
                break;
            }
        }

        match panic::catch_unwind(AssertUnwindSafe(|| analyzer.run(&page))) {
            Ok(evaluation) => evaluations.push(evaluation),
            Err(_) => {
                tracing::error!("A check panicked on {}", page.url);
                failure = Some(CheckerError::CheckPanicked { url: page.url });
                break;
            }
        }

        if evaluations.len() % 10 == 0 {
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier",
                evaluations.len(),
                crawler.frontier().len()
            );
        }
    }

    let visits = crawler.visits().to_vec();

    if failure.is_none() {
        if let Some(target) = storage.as_mut() {
            let recorded = visits
                .iter()
                .try_for_each(|v| target.storage.record_visit(target.run_id, &v.url, v.state));
            if let Err(e) = recorded {
                failure = Some(e.into());
            }
        }
    }

    if let Err(e) = crawler.close().await {
        tracing::warn!("Failed to close fetch session: {}", e);
    }

    if let Some(e) = failure {
        return Err(e);
    }

    tracing::info!(
        "Crawl completed: {} pages, {} skipped in {:?}",
        evaluations.len(),
        visits.iter().filter(|v| v.state.is_skip()).count(),
        start_time.elapsed()
    );

    Ok(CrawlOutcome {
        evaluations,
        visits,
    })
}
