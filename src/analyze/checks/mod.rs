//! Built-in page checks

mod content;
mod cookie_database;
mod network;

pub use content::{
    next_allowed_headings, DetectPageBuilder, H1Headings, HeadingStructure, SemanticHtml,
};
pub use cookie_database::{CookieDatabase, CookieDatabaseError, CookieInfo};
pub use network::{BigResources, CookiesWithoutConsent, ExternalNetworkAccess, ResourceLoadErrors};

use crate::analyze::Check;

#[cfg(test)]
pub(crate) use cookie_database::tests::write_cookie_csv;

/// The statically registered check list used by [`crate::analyze::Analyzer::default`]
pub fn default_checks() -> Vec<Box<dyn Check>> {
    checks_with(CookieDatabase::default())
}

/// The standard checks, describing cookies with `cookies`
pub fn checks_with(cookies: CookieDatabase) -> Vec<Box<dyn Check>> {
    vec![
        Box::new(CookiesWithoutConsent::new(cookies)),
        Box::new(ExternalNetworkAccess),
        Box::new(ResourceLoadErrors),
        Box::new(BigResources),
        Box::new(H1Headings),
        Box::new(HeadingStructure),
        Box::new(SemanticHtml),
        Box::new(DetectPageBuilder),
    ]
}
