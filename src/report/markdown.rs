//! Markdown report generation
//!
//! This module renders a [`ReportData`] as a human-readable markdown document:
//! run metadata, the site-wide check summary, the sitemap, per-page results
//! and the check descriptions.

use crate::analyze::{CheckResult, ResultPayload};
use crate::report::{ReportData, ReportResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(ReportError::Io)` - The file could not be written
pub fn write_markdown_report(report: &ReportData, output_path: &Path) -> ReportResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a report as markdown
pub fn format_markdown_report(report: &ReportData) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# Website Check: {}\n\n", report.url));

    md.push_str(&format!("- **Created**: {}\n", report.creation_date()));
    md.push_str(&format!("- **Pages**: {}\n", report.pages.len()));
    md.push_str(&format!("- **Overall Status**: {}\n", report.overall_status()));
    if !report.common_tags.is_empty() {
        md.push_str(&format!("- **Tags**: {}\n", report.common_tags.join(", ")));
    }
    md.push('\n');

    // Summary
    md.push_str("## Summary\n\n");
    md.push_str("| Check | Status |\n");
    md.push_str("|-------|--------|\n");
    for entry in &report.summary {
        md.push_str(&format!(
            "| {} | {} |\n",
            escape_cell(&entry.title),
            entry.status
        ));
    }
    md.push('\n');

    // Sitemap
    md.push_str("## Sitemap\n\n");
    for page in report.sitemap() {
        let title = if page.title.is_empty() {
            page.url.as_str()
        } else {
            page.title.as_str()
        };
        md.push_str(&format!("- [{}]({}) ({})\n", title, page.url, page.status));
    }
    md.push('\n');

    // Per-page results
    md.push_str("## Pages\n\n");
    for page in &report.pages {
        md.push_str(&format!("### {}\n\n", page.url));
        if !page.title.is_empty() {
            md.push_str(&format!("*{}* - {}\n\n", page.title, page.status));
        }
        for result in &page.results {
            push_result(&mut md, result);
        }
    }

    // Descriptions
    if !report.descriptions.is_empty() {
        md.push_str("## Checks\n\n");
        for entry in &report.descriptions {
            md.push_str(&format!("- **{}**: {}\n", entry.title, entry.description));
        }
        md.push('\n');
    }

    md
}

fn push_result(md: &mut String, result: &CheckResult) {
    md.push_str(&format!("#### {} ({})\n\n", result.title, result.status));

    match &result.payload {
        ResultPayload::Text(text) => {
            if !text.is_empty() {
                md.push_str(text);
                md.push_str("\n\n");
            }
        }
        ResultPayload::List(items) => {
            for item in items {
                md.push_str(&format!("- {}\n", item));
            }
            md.push('\n');
        }
        ResultPayload::Table { headers, rows } => {
            let cells: Vec<String> = headers.iter().map(|h| escape_cell(h)).collect();
            md.push_str(&format!("| {} |\n", cells.join(" | ")));
            md.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
            for row in rows {
                let cells: Vec<String> = row.iter().map(|c| escape_cell(c)).collect();
                md.push_str(&format!("| {} |\n", cells.join(" | ")));
            }
            md.push('\n');
        }
    }
}

/// Escapes pipes so a value cannot break a table row
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
