//! Report module for aggregating page evaluations
//!
//! This module handles:
//! - Rolling per-page check results up into a site-wide report
//! - Rendering the report as markdown

mod aggregate;
mod markdown;

pub use aggregate::build_report;
pub use markdown::{format_markdown_report, write_markdown_report};

use crate::analyze::{PageEvaluation, Status};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Date format used in rendered reports
pub const REPORT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Errors that can occur while building or writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Cannot build a report without any evaluated page")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Site-wide status of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub title: String,
    pub status: Status,
}

/// Description of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDescription {
    pub title: String,
    pub description: String,
}

/// Aggregated report over all evaluated pages
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    /// Representative URL (first page after sorting)
    pub url: String,

    /// One entry per check title, sorted by title
    pub summary: Vec<StatusSummary>,

    /// Evaluations sorted by URL
    pub pages: Vec<PageEvaluation>,

    /// One entry per check title with a description, sorted by title
    pub descriptions: Vec<CheckDescription>,

    /// Tags present on every page, sorted
    pub common_tags: Vec<String>,

    pub screenshot: Option<Vec<u8>>,
    pub created: DateTime<Utc>,
}

impl ReportData {
    /// Pages in sitemap order
    pub fn sitemap(&self) -> &[PageEvaluation] {
        &self.pages
    }

    /// Highest status across the summary
    pub fn overall_status(&self) -> Status {
        self.summary
            .iter()
            .map(|s| s.status)
            .max()
            .unwrap_or(Status::Ok)
    }

    /// Creation timestamp formatted for display
    pub fn creation_date(&self) -> String {
        self.created.format(REPORT_DATE_FORMAT).to_string()
    }
}
