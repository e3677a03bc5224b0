/// Traversal state definitions for a single attempted URL
///
/// Every URL taken from the frontier moves `Pending -> Fetching` and then into
/// exactly one terminal state.
use std::fmt;

/// Represents the state of one URL in the traversal state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// URL is waiting in the frontier
    Pending,

    /// Navigation to the URL is in progress
    Fetching,

    // ===== Terminal Success State =====
    /// Page was loaded and handed to the caller
    Success,

    // ===== Terminal Skip States =====
    /// Navigation redirected to a URL outside the audited domain
    SkipExternalRedirect,

    /// Navigation redirected to a URL that was already processed
    SkipAlreadyVisited,

    /// Navigation produced no page (e.g. a direct file download)
    SkipNoPage,

    /// Navigation failed (timeout, DNS, connection refused, ...)
    SkipNavigationError,
}

impl FetchState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if this is the success state
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if this is one of the recoverable skip states
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::SkipExternalRedirect
                | Self::SkipAlreadyVisited
                | Self::SkipNoPage
                | Self::SkipNavigationError
        )
    }

    /// Checks whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Fetching),
            Self::Fetching => next.is_terminal(),
            _ => false,
        }
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Success => "success",
            Self::SkipExternalRedirect => "skip_external_redirect",
            Self::SkipAlreadyVisited => "skip_already_visited",
            Self::SkipNoPage => "skip_no_page",
            Self::SkipNavigationError => "skip_navigation_error",
        }
    }

    /// Parses a state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "fetching" => Some(Self::Fetching),
            "success" => Some(Self::Success),
            "skip_external_redirect" => Some(Self::SkipExternalRedirect),
            "skip_already_visited" => Some(Self::SkipAlreadyVisited),
            "skip_no_page" => Some(Self::SkipNoPage),
            "skip_navigation_error" => Some(Self::SkipNavigationError),
            _ => None,
        }
    }

    /// Returns all possible states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Fetching,
            Self::Success,
            Self::SkipExternalRedirect,
            Self::SkipAlreadyVisited,
            Self::SkipNoPage,
            Self::SkipNavigationError,
        ]
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
