//! Check results and per-page evaluations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a check result
///
/// Ordered so that aggregation can take the maximum: `Ok < Warning < Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultPayload {
    Text(String),
    List(Vec<String>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Outcome of one check on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub title: String,
    pub description: Option<String>,
    pub payload: ResultPayload,
    pub status: Status,
    pub tags: Vec<String>,
}

impl CheckResult {
    /// Creates a result with a text payload
    pub fn text(title: impl Into<String>, text: impl Into<String>, status: Status) -> Self {
        Self {
            title: title.into(),
            description: None,
            payload: ResultPayload::Text(text.into()),
            status,
            tags: Vec::new(),
        }
    }

    /// Creates a result with a list payload
    pub fn list(title: impl Into<String>, items: Vec<String>, status: Status) -> Self {
        Self {
            title: title.into(),
            description: None,
            payload: ResultPayload::List(items),
            status,
            tags: Vec::new(),
        }
    }

    /// Creates a result with a table payload
    pub fn table(
        title: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        status: Status,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            payload: ResultPayload::Table { headers, rows },
            status,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a tag, ignoring duplicates
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }
}

/// All check results for one page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEvaluation {
    pub url: String,
    pub title: String,
    pub results: Vec<CheckResult>,

    /// Maximum severity among `results`, set by [`PageEvaluation::finalize`]
    pub status: Status,

    pub tags: Vec<String>,
    pub screenshot: Option<Vec<u8>>,
    pub created: DateTime<Utc>,
}

impl PageEvaluation {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            results: Vec::new(),
            status: Status::Ok,
            tags: Vec::new(),
            screenshot: None,
            created: Utc::now(),
        }
    }

    /// Attaches a result and takes over its tags
    pub fn add_result(&mut self, result: CheckResult) {
        for tag in &result.tags {
            if !self.tags.contains(tag) {
                self.tags.push(tag.clone());
            }
        }
        self.results.push(result);
    }

    /// Computes the page status once all results are attached
    pub fn finalize(&mut self) {
        self.status = max_status(&self.results);
    }
}

/// Highest severity among results, `Ok` when there are none
pub fn max_status(results: &[CheckResult]) -> Status {
    results
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(Status::Ok)
}
