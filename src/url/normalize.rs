use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves a discovered link into a canonical absolute URL
///
/// # Normalization Steps
///
/// 1. Remove the fragment (everything after `#`)
/// 2. Absolute links (anything with a scheme) are returned unchanged
/// 3. Protocol-relative links (`//host/path`) take the scheme of `domain`
/// 4. Root-relative links (`/path`) are appended to `domain`
/// 5. Everything else is resolved against `current_url`, which is treated as a
///    directory even when it does not end in `/`
///
/// Normalizing an already normalized URL returns it unchanged.
///
/// # Arguments
///
/// * `domain` - Base domain of the crawl (scheme and host, no trailing slash)
/// * `link` - The link as found in the page
/// * `current_url` - URL of the page the link was found on
///
/// # Examples
///
/// ```
/// use website_checker::url::normalize;
///
/// let url = normalize("https://a.test", "/x#frag", "https://a.test/y").unwrap();
/// assert_eq!(url, "https://a.test/x");
///
/// let url = normalize("https://a.test", "sub", "https://a.test/dir").unwrap();
/// assert_eq!(url, "https://a.test/dir/sub");
/// ```
pub fn normalize(domain: &str, link: &str, current_url: &str) -> UrlResult<String> {
    let link = strip_fragment(link.trim());

    if has_scheme(link) {
        return Ok(link.to_string());
    }

    if let Some(rest) = link.strip_prefix("//") {
        let scheme = Url::parse(domain)
            .map_err(|e| UrlError::Parse(format!("{}: {}", domain, e)))?
            .scheme()
            .to_string();
        return Ok(format!("{}://{}", scheme, rest));
    }

    if link.starts_with('/') {
        return Ok(format!("{}{}", domain.trim_end_matches('/'), link));
    }

    let base = if current_url.ends_with('/') {
        current_url.to_string()
    } else {
        format!("{}/", current_url)
    };

    let resolved = Url::parse(&base)
        .and_then(|base_url| base_url.join(link))
        .map_err(|_| UrlError::Unresolvable {
            link: link.to_string(),
            base: current_url.to_string(),
        })?;

    Ok(strip_fragment(resolved.as_str()).to_string())
}

/// Removes everything from the first `#` on
fn strip_fragment(link: &str) -> &str {
    match link.find('#') {
        Some(index) => &link[..index],
        None => link,
    }
}

/// Checks whether a link starts with a URL scheme such as `https:` or `mailto:`
fn has_scheme(link: &str) -> bool {
    let Some(colon) = link.find(':') else {
        return false;
    };

    let scheme = &link[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
