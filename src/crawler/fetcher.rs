//! Page fetching
//!
//! This module defines the capability the crawler needs from a browser-like
//! session ([`PageFetcher`]) and an HTTP implementation of it:
//! - Building HTTP clients with proper user agent strings
//! - Navigating to a URL, following redirects, and reporting the final URL
//! - Reporting network traffic into a [`NetworkCapture`]
//! - Treating non-HTML responses as downloads that can be cancelled
//! - Isolated cookie jars per navigation

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::capture::NetworkCapture;
use crate::crawler::parser::parse_html;
use crate::page::{Cookie, Download};
use crate::url::{base_domain, normalize};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client, Response};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Upper bound for sub-resources requested per page
const MAX_SUBRESOURCES: usize = 100;

/// Errors raised by a page fetcher
#[derive(Debug, Error)]
pub enum FetchError {
    /// The browser/session could not be started
    #[error("Failed to start fetch session: {0}")]
    Session(String),

    /// Navigation failed (DNS, connection refused, TLS, ...)
    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Navigation did not complete in time
    #[error("Navigation to {url} timed out")]
    Timeout { url: String },
}

/// Document state after a navigation has completed
#[derive(Debug, Clone, Default)]
pub struct LoadedPage {
    /// URL actually loaded (after redirects)
    pub url: String,
    pub title: String,
    pub html: String,
    pub cookies: Vec<Cookie>,
    pub screenshot: Option<Vec<u8>>,
}

/// A browser-like session the crawler navigates with
///
/// During `navigate` the fetcher reports every response, finished request,
/// failed request and download into `capture`. Only one navigation is ever in
/// flight, so the crawler drains the capture after `navigate` returns.
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigates to `url` and waits until the page has loaded
    async fn navigate(
        &mut self,
        url: &str,
        capture: &mut NetworkCapture,
    ) -> Result<LoadedPage, FetchError>;

    /// Cancels a download started by the last navigation
    async fn cancel_download(&mut self, download: &Download) {
        tracing::trace!("Nothing to cancel for download {}", download.url);
    }

    /// Releases the session
    async fn close(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Total timeout for one request
/// * `redirect` - Redirect policy
/// * `jar` - Cookie jar, or None for a client without cookies
///
/// # Example
///
/// ```no_run
/// use reqwest::redirect::Policy;
/// use std::time::Duration;
/// use website_checker::config::UserAgentConfig;
/// use website_checker::crawler::build_http_client;
///
/// let client = build_http_client(
///     &UserAgentConfig::default(),
///     Duration::from_secs(30),
///     Policy::limited(10),
///     None,
/// )
/// .unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    redirect: Policy,
    jar: Option<Arc<Jar>>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(redirect)
        .gzip(true)
        .brotli(true);

    if let Some(jar) = jar {
        builder = builder.cookie_provider(jar);
    }

    builder.build()
}

/// Page fetcher backed by plain HTTP requests
///
/// Loads the document, then the scripts, stylesheets and images it references,
/// the way a browser would, and reports all of it as network events.
pub struct HttpFetcher {
    client: Client,
    jar: Arc<Jar>,
    user_agent: UserAgentConfig,
    timeout: Duration,
    fetch_subresources: bool,
    isolated_sessions: bool,
    in_flight_download: Option<Response>,
}

impl HttpFetcher {
    /// Starts a new session
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Session ready for navigation
    /// * `Err(FetchError::Session)` - The HTTP client could not be built
    pub fn new(config: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.navigation_timeout_secs);
        let jar = Arc::new(Jar::default());
        let client = build_http_client(user_agent, timeout, Policy::limited(10), Some(jar.clone()))
            .map_err(|e| FetchError::Session(e.to_string()))?;

        Ok(Self {
            client,
            jar,
            user_agent: user_agent.clone(),
            timeout,
            fetch_subresources: config.fetch_subresources,
            isolated_sessions: config.isolated_sessions,
            in_flight_download: None,
        })
    }

    /// Replaces the cookie jar, so no cookie of an earlier page leaks into the next one
    fn new_session(&mut self) -> Result<(), FetchError> {
        let jar = Arc::new(Jar::default());
        self.client = build_http_client(
            &self.user_agent,
            self.timeout,
            Policy::limited(10),
            Some(jar.clone()),
        )
        .map_err(|e| FetchError::Session(e.to_string()))?;
        self.jar = jar;
        Ok(())
    }

    /// Reads the cookies the jar holds for `url`
    fn cookies_for(&self, url: &str) -> Vec<Cookie> {
        let Ok(parsed) = Url::parse(url) else {
            return Vec::new();
        };
        let domain = parsed.host_str().map(str::to_string);

        self.jar
            .cookies(&parsed)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .map(|header| parse_cookie_header(&header, domain.as_deref()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn navigate(
        &mut self,
        url: &str,
        capture: &mut NetworkCapture,
    ) -> Result<LoadedPage, FetchError> {
        // A download left over from the previous page is abandoned
        self.in_flight_download = None;

        if self.isolated_sessions {
            self.new_session()?;
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Navigation {
                    url: url.to_string(),
                    reason: describe_error(&e),
                }
            }
        })?;

        let final_url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let content_type = headers.get("content-type").cloned();

        if !is_html(content_type.as_deref()) {
            tracing::debug!(
                "{} is not a page ({}), treating it as download",
                final_url,
                content_type.as_deref().unwrap_or("no content-type")
            );
            capture.on_download(Download {
                url: final_url.clone(),
                content_type,
            });
            self.in_flight_download = Some(response);
            return Ok(LoadedPage {
                url: final_url,
                ..LoadedPage::default()
            });
        }

        let headers_size = headers_size(response.headers());
        capture.on_response(&final_url, status, headers.clone());

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                capture.on_request_failed(&final_url, describe_error(&e));
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: describe_error(&e),
                });
            }
        };
        capture.on_request_finished(&final_url, sizes(headers_size, html.len()), headers);

        let parsed = parse_html(&html);

        let same_origin = base_domain(&final_url).ok() == base_domain(url).ok();
        if self.fetch_subresources && !same_origin {
            tracing::debug!(
                "{} left the origin of {}, not loading its sub-resources",
                final_url,
                url
            );
        }

        if self.fetch_subresources && same_origin {
            if let Ok(domain) = base_domain(&final_url) {
                let mut requested: Vec<String> = Vec::new();
                for src in &parsed.subresources {
                    let Ok(resource_url) = normalize(&domain, src, &final_url) else {
                        continue;
                    };
                    if !resource_url.starts_with("http") || requested.contains(&resource_url) {
                        continue;
                    }
                    if requested.len() >= MAX_SUBRESOURCES {
                        tracing::debug!("Sub-resource limit reached for {}", final_url);
                        break;
                    }
                    load_subresource(&self.client, &resource_url, capture).await;
                    requested.push(resource_url);
                }
            }
        }

        Ok(LoadedPage {
            cookies: self.cookies_for(&final_url),
            title: parsed.title.unwrap_or_default(),
            url: final_url,
            html,
            screenshot: None,
        })
    }

    async fn cancel_download(&mut self, download: &Download) {
        if self.in_flight_download.take().is_some() {
            tracing::debug!("Cancelled download of {}", download.url);
        }
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.in_flight_download = None;
        Ok(())
    }
}

/// Requests one sub-resource and records what happened
async fn load_subresource(client: &Client, url: &str, capture: &mut NetworkCapture) {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            capture.on_request_failed(url, describe_error(&e));
            return;
        }
    };

    let status = response.status().as_u16();
    let headers = header_map(response.headers());
    let headers_size = headers_size(response.headers());
    capture.on_response(url, status, headers.clone());

    match response.bytes().await {
        Ok(body) => {
            capture.on_request_finished(url, sizes(headers_size, body.len()), headers);
        }
        Err(e) => capture.on_request_failed(url, describe_error(&e)),
    }
}

/// Decides whether a response is a page, based on its Content-Type
///
/// A missing Content-Type is treated as HTML, like browsers sniffing the body.
pub fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        Some(ct) => {
            let ct = ct.to_ascii_lowercase();
            ct.contains("text/html") || ct.contains("application/xhtml+xml")
        }
        None => true,
    }
}

/// Parses a `Cookie` request header (`a=1; b=2`) into cookie records
pub fn parse_cookie_header(header: &str, domain: Option<&str>) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some(Cookie {
                name: name.to_string(),
                value: value.to_string(),
                domain: domain.map(str::to_string),
            })
        })
        .collect()
}

/// Copies response headers into a map with lowercase names
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// Approximate size of the response header block on the wire
fn headers_size(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len() + 4)
        .sum()
}

/// Byte counts per capture phase
fn sizes(headers_size: usize, body_size: usize) -> BTreeMap<String, u64> {
    let mut sizes = BTreeMap::new();
    sizes.insert("responseHeadersSize".to_string(), headers_size as u64);
    sizes.insert("responseBodySize".to_string(), body_size as u64);
    sizes
}

/// Classifies a reqwest error into a short failure reason
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else if error.is_redirect() {
        format!("Redirect error: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(
            &UserAgentConfig::default(),
            Duration::from_secs(5),
            Policy::none(),
            None,
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_new_fetcher() {
        let fetcher = HttpFetcher::new(&CrawlerConfig::default(), &UserAgentConfig::default());
        assert!(fetcher.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html(Some("text/html")));
        assert!(is_html(Some("text/html; charset=utf-8")));
        assert!(is_html(Some("application/xhtml+xml")));
        assert!(is_html(None));

        assert!(!is_html(Some("application/pdf")));
        assert!(!is_html(Some("image/png")));
        assert!(!is_html(Some("application/octet-stream")));
    }

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("_ga=GA1.2; _gid=abc; broken", Some("a.test"));
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name, "_ga");
        assert_eq!(cookies[0].value, "GA1.2");
        assert_eq!(cookies[1].name, "_gid");
        assert_eq!(cookies[1].domain.as_deref(), Some("a.test"));
    }

    #[test]
    fn test_sizes() {
        let sizes = sizes(120, 2048);
        assert_eq!(sizes.get("responseHeadersSize"), Some(&120));
        assert_eq!(sizes.get("responseBodySize"), Some(&2048));
    }
}
