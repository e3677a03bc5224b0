use crate::analyze::{PageEvaluation, Status};
use crate::report::{CheckDescription, ReportData, ReportError, ReportResult, StatusSummary};
use crate::url::strip_trailing_slash;
use std::collections::{BTreeMap, BTreeSet};

/// Rolls per-page evaluations up into a report
///
/// Pages are sorted by URL, ignoring one trailing slash; ties keep their input
/// order. Each page gets its results sorted by title and its status set to the
/// most severe result. The summary holds the most severe status seen per check
/// title, and common tags are the tags every page carries.
///
/// # Returns
///
/// * `Ok(ReportData)` - The aggregated report
/// * `Err(ReportError::EmptyInput)` - No evaluation was given
pub fn build_report(mut evaluations: Vec<PageEvaluation>) -> ReportResult<ReportData> {
    if evaluations.is_empty() {
        return Err(ReportError::EmptyInput);
    }

    evaluations.sort_by(|a, b| strip_trailing_slash(&a.url).cmp(strip_trailing_slash(&b.url)));

    let mut summary: BTreeMap<String, Status> = BTreeMap::new();
    let mut descriptions: BTreeMap<String, String> = BTreeMap::new();

    for page in &mut evaluations {
        page.results.sort_by(|a, b| a.title.cmp(&b.title));
        page.finalize();

        for result in &page.results {
            let status = summary.entry(result.title.clone()).or_insert(result.status);
            *status = (*status).max(result.status);

            if let Some(description) = result.description.as_ref().filter(|d| !d.is_empty()) {
                descriptions
                    .entry(result.title.clone())
                    .or_insert_with(|| description.clone());
            }
        }
    }

    let common_tags = common_tags(&evaluations);

    let first = &evaluations[0];
    let url = first.url.clone();
    let screenshot = first.screenshot.clone();
    let created = first.created;

    tracing::debug!(
        "Report over {} pages with {} checks",
        evaluations.len(),
        summary.len()
    );

    Ok(ReportData {
        url,
        summary: summary
            .into_iter()
            .map(|(title, status)| StatusSummary { title, status })
            .collect(),
        pages: evaluations,
        descriptions: descriptions
            .into_iter()
            .map(|(title, description)| CheckDescription { title, description })
            .collect(),
        common_tags,
        screenshot,
        created,
    })
}

/// Sorted intersection of the tag sets of all pages
fn common_tags(pages: &[PageEvaluation]) -> Vec<String> {
    let mut iter = pages.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut common: BTreeSet<&str> = first.tags.iter().map(String::as_str).collect();
    for page in iter {
        common.retain(|tag| page.tags.iter().any(|t| t.as_str() == *tag));
    }

    common.into_iter().map(str::to_string).collect()
}
