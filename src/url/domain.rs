use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercase host of a URL string
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the string is not an absolute URL with a host
///
/// # Examples
///
/// ```
/// use website_checker::url::extract_host;
///
/// assert_eq!(extract_host("https://EXAMPLE.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_host("example.com"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}

/// Reduces a URL to scheme and host (port included), without path, query or fragment
///
/// # Examples
///
/// ```
/// use website_checker::url::base_domain;
///
/// let domain = base_domain("https://www.domain.test/subdirectory/test").unwrap();
/// assert_eq!(domain, "https://www.domain.test");
/// ```
pub fn base_domain(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(url.to_string()))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Classifies a URL as internal to the audited domain
///
/// A URL is internal if it equals `domain` or starts with `domain/`. With
/// `allow_subdomain`, a URL whose host is a subdomain of the domain's host is
/// internal as well (`cdn.example.com` for `example.com`). Subdomains are
/// trusted for link following only; third-party checks use the strict form.
///
/// # Examples
///
/// ```
/// use website_checker::url::is_internal;
///
/// assert!(is_internal("https://a.test/y", "https://a.test", false));
/// assert!(!is_internal("https://a.test.evil.com", "https://a.test", false));
/// assert!(is_internal("https://cdn.a.test/lib.js", "https://a.test", true));
/// ```
pub fn is_internal(url: &str, domain: &str, allow_subdomain: bool) -> bool {
    let domain = domain.trim_end_matches('/');
    if url == domain || url.starts_with(&format!("{}/", domain)) {
        return true;
    }

    if !allow_subdomain {
        return false;
    }

    match (extract_host(url), extract_host(domain)) {
        (Some(url_host), Some(domain_host)) => {
            url_host == domain_host || url_host.ends_with(&format!(".{}", domain_host))
        }
        _ => false,
    }
}
