//! Checks over the captured network traffic of a page

use crate::analyze::checks::CookieDatabase;
use crate::analyze::{Check, CheckResult, Status};
use crate::page::Page;
use crate::url::{base_domain, is_internal};
use std::collections::BTreeMap;

/// Transfer size above which a resource is reported
const WARNING_LIMIT_BYTES: u64 = 512 * 1024;

/// Transfer size above which a resource fails the page
const ERROR_LIMIT_BYTES: u64 = 1024 * 1024;

/// Placeholder for cookie details the database does not know
const UNKNOWN: &str = "unknown";

/// Lists cookies that were set without any user interaction
///
/// Each cookie is described with platform, category and purpose from the
/// cookie database when it is known there.
#[derive(Debug, Default)]
pub struct CookiesWithoutConsent {
    database: CookieDatabase,
}

impl CookiesWithoutConsent {
    pub fn new(database: CookieDatabase) -> Self {
        Self { database }
    }

    fn describe(&self, name: &str) -> Vec<String> {
        match self.database.search(name) {
            Some(info) => vec![
                name.to_string(),
                or_unknown(info.platform),
                or_unknown(info.category),
                or_unknown(info.description),
            ],
            None => vec![
                name.to_string(),
                UNKNOWN.to_string(),
                UNKNOWN.to_string(),
                UNKNOWN.to_string(),
            ],
        }
    }
}

fn or_unknown(value: String) -> String {
    if value.is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

impl Check for CookiesWithoutConsent {
    fn title(&self) -> &'static str {
        "Cookie without consent"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let result = if page.cookies.is_empty() {
            CheckResult::text(
                self.title(),
                "Well done, no cookies set without prior consent.",
                Status::Ok,
            )
        } else {
            let rows = page.cookies.iter().map(|c| self.describe(&c.name)).collect();
            CheckResult::table(
                self.title(),
                vec![
                    "Name".to_string(),
                    "Platform".to_string(),
                    "Category".to_string(),
                    "Description".to_string(),
                ],
                rows,
                Status::Warning,
            )
        };
        result.with_description("The following cookies are set without consent.")
    }
}

/// Lists responses served from outside the page's own origin
pub struct ExternalNetworkAccess;

impl Check for ExternalNetworkAccess {
    fn title(&self) -> &'static str {
        "External network access"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let domain = base_domain(&page.url).unwrap_or_else(|_| page.url.clone());

        let mut external: Vec<String> = Vec::new();
        for resource in &page.elements {
            if !is_internal(&resource.url, &domain, false) && !external.contains(&resource.url) {
                external.push(resource.url.clone());
            }
        }

        let result = if external.is_empty() {
            CheckResult::text(
                self.title(),
                "Nice, no external network access detected.",
                Status::Ok,
            )
        } else {
            CheckResult::list(self.title(), external, Status::Warning)
        };
        result.with_description("Searches for network access to external servers.")
    }
}

/// Lists failed requests and error responses
pub struct ResourceLoadErrors;

impl Check for ResourceLoadErrors {
    fn title(&self) -> &'static str {
        "Resource load errors"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let mut invalid: Vec<String> = page
            .failed_requests
            .iter()
            .filter_map(|r| r.failure.as_ref().map(|f| format!("{}, {}", r.url, f)))
            .collect();

        for resource in &page.elements {
            if let Some(code) = resource.status_code.filter(|c| (400..600).contains(c)) {
                invalid.push(format!("{}, {}", resource.url, code));
            }
        }

        let result = if invalid.is_empty() {
            CheckResult::text(
                self.title(),
                "Nice, all resources load as expected.",
                Status::Ok,
            )
        } else {
            CheckResult::list(self.title(), invalid, Status::Warning)
        };
        result.with_description("Searches for resources that do not load.")
    }
}

/// Reports resources whose transfer size slows down page load
pub struct BigResources;

impl BigResources {
    /// Largest known size per URL, from finished requests or Content-Length
    fn sizes(page: &Page) -> BTreeMap<&str, u64> {
        let mut sizes: BTreeMap<&str, u64> = BTreeMap::new();

        for request in &page.requests {
            let entry = sizes.entry(request.url.as_str()).or_insert(0);
            *entry = (*entry).max(request.total_size());
        }

        for resource in &page.elements {
            let length = resource
                .header("content-length")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0);
            let entry = sizes.entry(resource.url.as_str()).or_insert(0);
            *entry = (*entry).max(length);
        }

        sizes
    }
}

impl Check for BigResources {
    fn title(&self) -> &'static str {
        "Big resources"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let mut status = Status::Ok;
        let mut big: Vec<String> = Vec::new();

        for (url, size) in Self::sizes(page) {
            if size > ERROR_LIMIT_BYTES {
                status = Status::Failed;
            }
            if size > WARNING_LIMIT_BYTES {
                status = status.max(Status::Warning);
                big.push(format!("{}, {:.0} kB", url, size as f64 / 1024.0));
            }
        }

        let result = if big.is_empty() {
            CheckResult::text(self.title(), "Nice, no big resource found.", Status::Ok)
        } else {
            CheckResult::list(self.title(), big, status)
        };
        result.with_description("Looks for large resources that noticeably increase page load time.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::checks::cookie_database::tests::write_cookie_csv;
    use crate::analyze::ResultPayload;
    use crate::page::{Cookie, Resource, ResourceRequest};

    fn request(url: &str, body: u64) -> ResourceRequest {
        let mut sizes = BTreeMap::new();
        sizes.insert("responseBodySize".to_string(), body);
        ResourceRequest::finished(url, sizes)
    }

    #[test]
    fn test_no_cookies() {
        let page = Page::new("https://a.test/");
        let result = CookiesWithoutConsent::default().check(&page);
        assert_eq!(result.status, Status::Ok);
        assert!(matches!(result.payload, ResultPayload::Text(_)));
    }

    #[test]
    fn test_cookies_described_from_database() {
        let file = write_cookie_csv();
        let check = CookiesWithoutConsent::new(CookieDatabase::load(file.path()).unwrap());

        let mut page = Page::new("https://a.test/");
        page.cookies.push(Cookie::new("CookieConsentBulkTicket", "1"));
        page.cookies.push(Cookie::new("_gat_gtag_UA_1_1", "2"));

        let result = check.check(&page);
        assert_eq!(result.status, Status::Warning);
        assert!(result.description.is_some());

        let ResultPayload::Table { headers, rows } = result.payload else {
            panic!("expected a table");
        };
        assert_eq!(headers, vec!["Name", "Platform", "Category", "Description"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][..3], ["CookieConsentBulkTicket", "Cookiebot", "Functional"]);
        assert_eq!(rows[1][..3], ["_gat_gtag_UA_1_1", "Google Analytics", "Analytics"]);
    }

    #[test]
    fn test_unknown_cookie() {
        let mut page = Page::new("https://a.test/");
        page.cookies.push(Cookie::new("unknown_cookie", "1"));

        let result = CookiesWithoutConsent::default().check(&page);
        assert_eq!(result.status, Status::Warning);
        assert_eq!(
            result.payload,
            ResultPayload::Table {
                headers: vec![
                    "Name".to_string(),
                    "Platform".to_string(),
                    "Category".to_string(),
                    "Description".to_string(),
                ],
                rows: vec![vec![
                    "unknown_cookie".to_string(),
                    "unknown".to_string(),
                    "unknown".to_string(),
                    "unknown".to_string(),
                ]],
            }
        );
    }

    #[test]
    fn test_external_network_access() {
        let mut page = Page::new("https://a.test/contact");
        page.elements.push(Resource::new("https://a.test/style.css"));
        page.elements.push(Resource::new("https://fonts.example.com/font.woff2"));
        page.elements.push(Resource::new("https://cdn.a.test/app.js"));

        let result = ExternalNetworkAccess.check(&page);
        assert_eq!(result.status, Status::Warning);
        assert_eq!(
            result.payload,
            ResultPayload::List(vec![
                "https://fonts.example.com/font.woff2".to_string(),
                "https://cdn.a.test/app.js".to_string(),
            ])
        );
    }

    #[test]
    fn test_only_internal_network_access() {
        let mut page = Page::new("https://a.test/");
        page.elements.push(Resource::new("https://a.test/"));
        page.elements.push(Resource::new("https://a.test/logo.svg"));

        assert_eq!(ExternalNetworkAccess.check(&page).status, Status::Ok);
    }

    #[test]
    fn test_resource_load_errors() {
        let mut page = Page::new("https://a.test/");
        page.failed_requests
            .push(ResourceRequest::failed("https://a.test/gone.js", "net::ERR_FAILED"));
        let mut missing = Resource::new("https://a.test/missing.css");
        missing.status_code = Some(404);
        page.elements.push(missing);
        let mut fine = Resource::new("https://a.test/ok.css");
        fine.status_code = Some(200);
        page.elements.push(fine);

        let result = ResourceLoadErrors.check(&page);
        assert_eq!(result.status, Status::Warning);
        assert_eq!(
            result.payload,
            ResultPayload::List(vec![
                "https://a.test/gone.js, net::ERR_FAILED".to_string(),
                "https://a.test/missing.css, 404".to_string(),
            ])
        );
    }

    #[test]
    fn test_no_load_errors() {
        let page = Page::new("https://a.test/");
        assert_eq!(ResourceLoadErrors.check(&page).status, Status::Ok);
    }

    #[test]
    fn test_big_resources_thresholds() {
        let mut page = Page::new("https://a.test/");
        page.requests.push(request("https://a.test/small.js", 10 * 1024));
        page.requests.push(request("https://a.test/medium.jpg", 600 * 1024));
        assert_eq!(BigResources.check(&page).status, Status::Warning);

        page.requests.push(request("https://a.test/huge.mp4", 2048 * 1024));
        let result = BigResources.check(&page);
        assert_eq!(result.status, Status::Failed);
        match result.payload {
            ResultPayload::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(items.contains(&"https://a.test/huge.mp4, 2048 kB".to_string()));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_big_resources_from_content_length() {
        let mut page = Page::new("https://a.test/");
        let mut resource = Resource::new("https://a.test/hero.png");
        resource
            .headers
            .insert("content-length".to_string(), (700 * 1024).to_string());
        page.elements.push(resource);

        assert_eq!(BigResources.check(&page).status, Status::Warning);
    }

    #[test]
    fn test_no_big_resources() {
        let mut page = Page::new("https://a.test/");
        page.requests.push(request("https://a.test/app.js", 1024));
        let result = BigResources.check(&page);
        assert_eq!(result.status, Status::Ok);
        assert!(result.description.is_some());
    }
}
