//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::page::Page;
use crate::state::FetchState;
use crate::storage::{RunRecord, RunStatus};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to persist a crawl.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `start_url` - The URL the crawl starts from
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, start_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Page Management =====

    /// Stores a crawled page with its cookies and network traffic
    ///
    /// # Returns
    ///
    /// The ID of the stored page
    fn save_page(&mut self, run_id: i64, page: &Page) -> StorageResult<i64>;

    /// Loads all pages of a run in crawl order
    fn load_pages(&self, run_id: i64) -> StorageResult<Vec<Page>>;

    /// Counts the pages of a run
    fn count_pages(&self, run_id: i64) -> StorageResult<u64>;

    // ===== Visit Tracking =====

    /// Records the terminal state of an attempted URL
    fn record_visit(&mut self, run_id: i64, url: &str, state: FetchState) -> StorageResult<()>;

    /// Counts attempted URLs per terminal state
    fn visit_summary(&self, run_id: i64) -> StorageResult<HashMap<FetchState, u64>>;
}
