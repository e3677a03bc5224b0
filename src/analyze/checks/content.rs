//! Checks over the HTML document of a page

use crate::analyze::{Check, CheckResult, Status};
use crate::page::Page;
use scraper::{ElementRef, Html, Selector};

/// Class prefixes left behind by common page builders
const PAGE_BUILDER_CLASSES: &[(&str, &str)] = &[
    ("Beaver Builder", "[class^='fl-']"),
    ("Bricks", "[class^='brxe-']"),
    ("Divi", "[class^='et_pb_']"),
    ("Elementor", "[class^='elementor-']"),
    ("Jimdo", "[class^='jmd-']"),
    ("Oxygen Builder", "[class^='ct-']"),
    ("SquareSpace", "[class^='sqs-']"),
    ("Visual Composer", "[class^='vc_']"),
];

const SEMANTIC_TAGS: &[&str] = &[
    "header", "nav", "main", "section", "article", "aside", "footer",
];

fn select<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Truncates long heading texts for display
fn shorten(text: &str, length: usize) -> String {
    if text.chars().count() > length {
        let head: String = text.chars().take(length).collect();
        format!("{}..", head)
    } else {
        text.to_string()
    }
}

/// Heading levels allowed after `previous` (`None` = first heading)
pub fn next_allowed_headings(previous: Option<u8>) -> Vec<u8> {
    match previous {
        None => vec![1],
        Some(level) => (2..=(level + 1).min(6)).collect(),
    }
}

/// Expects exactly one `<h1>` per page
pub struct H1Headings;

impl Check for H1Headings {
    fn title(&self) -> &'static str {
        "H1 Headings"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let document = Html::parse_document(&page.html);
        let headings = select(&document, "h1");

        let result = match headings.first() {
            Some(first) if headings.len() == 1 => CheckResult::text(
                self.title(),
                format!("Great, one H1 heading '{}' found.", element_text(first)),
                Status::Ok,
            ),
            Some(first) => CheckResult::text(
                self.title(),
                format!(
                    "Multiple H1 headings found, first one is '{}'.",
                    element_text(first)
                ),
                Status::Warning,
            ),
            None => CheckResult::text(self.title(), "No H1 heading found.", Status::Failed),
        };
        result.with_description("Checks existence of exactly one H1 heading.")
    }
}

/// Headings must start at h1 and never skip a level going down
pub struct HeadingStructure;

impl Check for HeadingStructure {
    fn title(&self) -> &'static str {
        "Heading structure"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let document = Html::parse_document(&page.html);
        let headings = select(&document, "h1, h2, h3, h4, h5, h6");

        let mut seen: Vec<String> = Vec::new();
        let mut previous: Option<u8> = None;

        for heading in &headings {
            let name = heading.value().name();
            let level = name[1..].parse::<u8>().unwrap_or(1);
            let text = shorten(&element_text(heading), 50);
            seen.push(format!("[{}] {}", name, text));

            let allowed = next_allowed_headings(previous);
            if !allowed.contains(&level) {
                let expected: Vec<String> = allowed.iter().map(|l| format!("h{}", l)).collect();
                seen.insert(
                    0,
                    format!(
                        "Heading '{}' found as {}, but expected one of {}.",
                        text,
                        name,
                        expected.join(", ")
                    ),
                );
                return CheckResult::list(self.title(), seen, Status::Warning)
                    .with_description("Checks whether the heading structure is valid.");
            }
            previous = Some(level);
        }

        let result = if seen.is_empty() {
            CheckResult::text(self.title(), "No heading found.", Status::Warning)
        } else {
            CheckResult::text(
                self.title(),
                "Great, the heading structure is perfect.",
                Status::Ok,
            )
        };
        result.with_description("Checks whether the heading structure is valid.")
    }
}

/// Counts structural semantic elements
pub struct SemanticHtml;

impl Check for SemanticHtml {
    fn title(&self) -> &'static str {
        "Semantic HTML tags"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let document = Html::parse_document(&page.html);

        let mut total = 0;
        let mut counts: Vec<String> = Vec::new();
        for tag in SEMANTIC_TAGS {
            let count = select(&document, tag).len();
            if count > 0 {
                total += count;
                counts.push(format!("{} ({})", tag, count));
            }
        }

        let result = if total > 0 {
            CheckResult::text(
                self.title(),
                format!(
                    "Good, {} structural semantic tags are used: {}",
                    total,
                    counts.join(", ")
                ),
                Status::Ok,
            )
        } else {
            CheckResult::text(
                self.title(),
                "No structural semantic tags found. Consider adding some.",
                Status::Warning,
            )
        };
        result.with_description(
            "Checks usage of structural semantic HTML tags, which are good for accessibility and SEO.",
        )
    }
}

/// Tags pages built with WordPress and with a known page builder
pub struct DetectPageBuilder;

impl Check for DetectPageBuilder {
    fn title(&self) -> &'static str {
        "Detect Page Builder"
    }

    fn check(&self, page: &Page) -> CheckResult {
        let mut detected: Vec<String> = Vec::new();

        if page.elements.iter().any(|e| e.url.contains("/wp-content/")) {
            detected.push("WordPress".to_string());
        }

        let document = Html::parse_document(&page.html);
        let mut best: Option<(&str, usize)> = None;
        for (name, selector) in PAGE_BUILDER_CLASSES {
            let count = select(&document, selector).len();
            if count > 0 && best.map_or(true, |(_, max)| count > max) {
                best = Some((*name, count));
            }
        }
        if let Some((name, _)) = best {
            detected.push(name.to_string());
        }

        let mut result = if detected.is_empty() {
            CheckResult::text(self.title(), "No page builder detected.", Status::Ok)
        } else {
            CheckResult::text(
                self.title(),
                format!("Detected: {}", detected.join(", ")),
                Status::Ok,
            )
        };
        for tag in detected {
            result.add_tag(tag);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::ResultPayload;
    use crate::page::Resource;

    fn page(html: &str) -> Page {
        let mut page = Page::new("https://a.test/");
        page.html = html.to_string();
        page
    }

    #[test]
    fn test_next_allowed_headings() {
        assert_eq!(next_allowed_headings(None), vec![1]);
        assert_eq!(next_allowed_headings(Some(1)), vec![2]);
        assert_eq!(next_allowed_headings(Some(3)), vec![2, 3, 4]);
        assert_eq!(next_allowed_headings(Some(6)), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_single_h1() {
        let result = H1Headings.check(&page("<h1>Welcome</h1><h2>Sub</h2>"));
        assert_eq!(result.status, Status::Ok);
        assert_eq!(
            result.payload,
            ResultPayload::Text("Great, one H1 heading 'Welcome' found.".to_string())
        );
    }

    #[test]
    fn test_multiple_h1() {
        let result = H1Headings.check(&page("<h1>One</h1><h1>Two</h1>"));
        assert_eq!(result.status, Status::Warning);
    }

    #[test]
    fn test_missing_h1() {
        let result = H1Headings.check(&page("<h2>Only sub</h2>"));
        assert_eq!(result.status, Status::Failed);
    }

    #[test]
    fn test_valid_heading_structure() {
        let html = "<h1>Title</h1><h2>A</h2><h3>A.1</h3><h2>B</h2>";
        let result = HeadingStructure.check(&page(html));
        assert_eq!(result.status, Status::Ok);
    }

    #[test]
    fn test_skipped_heading_level() {
        let html = "<h1>Title</h1><h3>Too deep</h3>";
        let result = HeadingStructure.check(&page(html));
        assert_eq!(result.status, Status::Warning);
        match result.payload {
            ResultPayload::List(items) => {
                assert_eq!(
                    items[0],
                    "Heading 'Too deep' found as h3, but expected one of h2."
                );
                assert_eq!(items.len(), 3);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_heading_structure_must_start_with_h1() {
        let result = HeadingStructure.check(&page("<h2>Intro</h2><h1>Title</h1>"));
        assert_eq!(result.status, Status::Warning);
    }

    #[test]
    fn test_no_headings() {
        let result = HeadingStructure.check(&page("<p>text</p>"));
        assert_eq!(result.status, Status::Warning);
    }

    #[test]
    fn test_semantic_html() {
        let html = "<header></header><main><section></section><section></section></main>";
        let result = SemanticHtml.check(&page(html));
        assert_eq!(result.status, Status::Ok);
        assert_eq!(
            result.payload,
            ResultPayload::Text(
                "Good, 4 structural semantic tags are used: header (1), main (1), section (2)"
                    .to_string()
            )
        );

        let result = SemanticHtml.check(&page("<div><p>plain</p></div>"));
        assert_eq!(result.status, Status::Warning);
    }

    #[test]
    fn test_detect_wordpress_and_builder() {
        let mut page = page(
            r#"<div class="brxe-section"><div class="brxe-block"></div></div><div class="elementor-x"></div>"#,
        );
        page.elements
            .push(Resource::new("https://a.test/wp-content/themes/style.css"));

        let result = DetectPageBuilder.check(&page);
        assert_eq!(result.tags, vec!["WordPress", "Bricks"]);
        assert_eq!(result.status, Status::Ok);
    }

    #[test]
    fn test_detect_nothing() {
        let result = DetectPageBuilder.check(&page("<div class=\"container\"></div>"));
        assert!(result.tags.is_empty());
    }
}
