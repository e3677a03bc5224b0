//! Records produced by the crawler
//!
//! A `Page` is built once per successful navigation and is immutable after it
//! has been handed to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cookie set while loading a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
        }
    }
}

/// A successfully observed network response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// The URL of the response
    pub url: String,

    /// HTTP status code
    pub status_code: Option<u16>,

    /// Response headers with lowercase names (content-length, content-type, ...)
    pub headers: BTreeMap<String, String>,
}

impl Resource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code: None,
            headers: BTreeMap::new(),
        }
    }

    /// Returns a header value by lowercase name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A finished or failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// The requested URL
    pub url: String,

    /// Byte counts per capture phase (`responseBodySize`, `responseHeadersSize`, ...)
    pub sizes: BTreeMap<String, u64>,

    /// Failure reason, absent for finished requests
    pub failure: Option<String>,

    /// Response headers, if any were received
    pub headers: BTreeMap<String, String>,
}

impl ResourceRequest {
    /// Creates a finished request record
    pub fn finished(url: impl Into<String>, sizes: BTreeMap<String, u64>) -> Self {
        Self {
            url: url.into(),
            sizes,
            failure: None,
            headers: BTreeMap::new(),
        }
    }

    /// Creates a failed request record
    pub fn failed(url: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            sizes: BTreeMap::new(),
            failure: Some(failure.into()),
            headers: BTreeMap::new(),
        }
    }

    /// Sum of all recorded byte counts
    pub fn total_size(&self) -> u64 {
        self.sizes.values().sum()
    }
}

/// A download started by a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub url: String,
    pub content_type: Option<String>,
}

/// One crawled page with everything captured while loading it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// URL the page was loaded from (after redirects)
    pub url: String,
    pub title: String,
    pub html: String,
    pub cookies: Vec<Cookie>,

    /// Observed network responses
    pub elements: Vec<Resource>,

    /// Requests that finished without failure
    pub requests: Vec<ResourceRequest>,

    /// Requests that failed
    pub failed_requests: Vec<ResourceRequest>,

    /// PNG screenshot, when the fetcher can take one
    pub screenshot: Option<Vec<u8>>,
    pub created: DateTime<Utc>,
}

impl Page {
    /// Creates an empty page record for a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            html: String::new(),
            cookies: Vec::new(),
            elements: Vec::new(),
            requests: Vec::new(),
            failed_requests: Vec::new(),
            screenshot: None,
            created: Utc::now(),
        }
    }

    /// Returns true if a response for `url` was observed
    pub fn has_element(&self, url: &str) -> bool {
        self.elements.iter().any(|e| e.url == url)
    }

    /// Returns true if a failed request for `url` was recorded
    pub fn has_failed_request(&self, url: &str) -> bool {
        self.failed_requests.iter().any(|r| r.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_size() {
        let mut sizes = BTreeMap::new();
        sizes.insert("responseBodySize".to_string(), 1000);
        sizes.insert("responseHeadersSize".to_string(), 24);
        let request = ResourceRequest::finished("https://a.test/app.js", sizes);
        assert_eq!(request.total_size(), 1024);
        assert!(request.failure.is_none());
    }

    #[test]
    fn test_failed_request() {
        let request = ResourceRequest::failed("https://a.test/missing.css", "net::ERR_FAILED");
        assert_eq!(request.failure.as_deref(), Some("net::ERR_FAILED"));
        assert_eq!(request.total_size(), 0);
    }

    #[test]
    fn test_page_lookups() {
        let mut page = Page::new("https://a.test/");
        page.elements.push(Resource::new("https://a.test/style.css"));
        page.failed_requests
            .push(ResourceRequest::failed("https://a.test/favicon.ico", "not found"));

        assert!(page.has_element("https://a.test/style.css"));
        assert!(!page.has_element("https://a.test/favicon.ico"));
        assert!(page.has_failed_request("https://a.test/favicon.ico"));
    }
}
