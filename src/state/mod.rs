//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FetchState`: Tracks one attempted URL through the traversal state machine
//! - `RateLimiter`: Spaces out navigations according to the configured interval

mod fetch_state;
mod rate_limit;

// Re-export main types
pub use fetch_state::FetchState;
pub use rate_limit::RateLimiter;
