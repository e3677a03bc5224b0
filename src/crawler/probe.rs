//! Favicon probe
//!
//! Favicons are often requested lazily by browsers, so the network capture of a
//! page may not contain them. The crawler requests each declared icon once
//! without following redirects and reconciles the outcome with the page record.

use crate::config::UserAgentConfig;
use crate::crawler::fetcher::build_http_client;
use crate::page::{Page, Resource, ResourceRequest};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Result of requesting one icon URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// HTTP 200 with an image content type
    Found { headers: BTreeMap<String, String> },

    /// Anything else, with a short reason
    Missing { reason: String },
}

/// Requests favicons with a short timeout and no redirects
#[derive(Debug, Clone)]
pub struct FaviconProbe {
    client: Client,
}

impl FaviconProbe {
    pub fn new(user_agent: &UserAgentConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, timeout, Policy::none(), None)?;
        Ok(Self { client })
    }

    /// Requests `url` and classifies the response
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return ProbeOutcome::Missing {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let is_image = headers
            .get("content-type")
            .map(|ct| ct.to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);

        if status == 200 && is_image {
            ProbeOutcome::Found { headers }
        } else if status != 200 {
            ProbeOutcome::Missing {
                reason: format!("HTTP {}", status),
            }
        } else {
            ProbeOutcome::Missing {
                reason: format!(
                    "Not an image: {}",
                    headers
                        .get("content-type")
                        .map(String::as_str)
                        .unwrap_or("no content-type")
                ),
            }
        }
    }
}

/// Merges a probe outcome for `url` into the page record
///
/// A found icon becomes an observed response unless one was captured already.
/// A missing icon becomes a failed request unless one was recorded already.
pub fn reconcile_favicon(page: &mut Page, url: &str, outcome: ProbeOutcome) {
    match outcome {
        ProbeOutcome::Found { headers } => {
            if !page.has_element(url) {
                page.elements.push(Resource {
                    url: url.to_string(),
                    status_code: Some(200),
                    headers,
                });
            }
        }
        ProbeOutcome::Missing { reason } => {
            if !page.has_failed_request(url) {
                page.failed_requests
                    .push(ResourceRequest::failed(url, format!("Favicon: {}", reason)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found() -> ProbeOutcome {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "image/x-icon".to_string());
        ProbeOutcome::Found { headers }
    }

    #[test]
    fn test_found_icon_added_as_element() {
        let mut page = Page::new("https://a.test/");
        reconcile_favicon(&mut page, "https://a.test/favicon.ico", found());

        assert_eq!(page.elements.len(), 1);
        assert_eq!(page.elements[0].status_code, Some(200));
        assert_eq!(
            page.elements[0].header("content-type"),
            Some("image/x-icon")
        );
        assert!(page.failed_requests.is_empty());
    }

    #[test]
    fn test_found_icon_not_duplicated() {
        let mut page = Page::new("https://a.test/");
        page.elements.push(Resource::new("https://a.test/favicon.ico"));
        reconcile_favicon(&mut page, "https://a.test/favicon.ico", found());

        assert_eq!(page.elements.len(), 1);
    }

    #[test]
    fn test_missing_icon_added_as_failure() {
        let mut page = Page::new("https://a.test/");
        reconcile_favicon(
            &mut page,
            "https://a.test/favicon.ico",
            ProbeOutcome::Missing {
                reason: "HTTP 404".to_string(),
            },
        );

        assert!(page.elements.is_empty());
        assert_eq!(page.failed_requests.len(), 1);
        assert!(page.has_failed_request("https://a.test/favicon.ico"));
    }

    #[test]
    fn test_missing_icon_not_duplicated() {
        let mut page = Page::new("https://a.test/");
        page.failed_requests.push(ResourceRequest::failed(
            "https://a.test/favicon.ico",
            "net::ERR_ABORTED",
        ));
        reconcile_favicon(
            &mut page,
            "https://a.test/favicon.ico",
            ProbeOutcome::Missing {
                reason: "HTTP 404".to_string(),
            },
        );

        assert_eq!(page.failed_requests.len(), 1);
        assert_eq!(
            page.failed_requests[0].failure.as_deref(),
            Some("net::ERR_ABORTED")
        );
    }
}
