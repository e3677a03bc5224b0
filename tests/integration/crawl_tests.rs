//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end: HTTP fetching, redirects, downloads,
//! favicon probing, analysis, persistence and reporting.

use std::time::Duration;
use tempfile::TempDir;
use website_checker::analyze::{Analyzer, Status};
use website_checker::config::{Config, UserAgentConfig};
use website_checker::crawler::{
    run_crawl, Crawler, FaviconProbe, HttpFetcher, NetworkCapture, PageFetcher, ProbeOutcome,
    RunStorage,
};
use website_checker::report::{build_report, format_markdown_report};
use website_checker::storage::{SqliteStorage, Storage};
use website_checker::FetchState;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short timeouts
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.navigation_timeout_secs = 5;
    config.crawler.probe_timeout_secs = 5;
    config.user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
    };
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_get(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

fn new_fetcher(config: &Config) -> HttpFetcher {
    HttpFetcher::new(&config.crawler, &config.user_agent).expect("Failed to create fetcher")
}

async fn collect(crawler: &mut Crawler<HttpFetcher>) -> Vec<website_checker::Page> {
    let mut pages = Vec::new();
    while let Some(page) = crawler.next_page().await {
        pages.push(page);
    }
    pages
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html(r#"<html><head><title>Home</title></head><body><main><h1>Home</h1><a href="/contact">Contact</a></main></body></html>"#),
    )
    .await;
    mount_get(
        &server,
        "/contact",
        html(r#"<html><head><title>Contact</title></head><body><h1>Contact</h1><a href="/">Home</a></body></html>"#),
    )
    .await;

    let config = create_test_config();
    let mut crawler = Crawler::new(&base, new_fetcher(&config), &config).unwrap();

    let pages = collect(&mut crawler).await;
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].url, format!("{}/", base));
    assert_eq!(pages[0].title, "Home");
    assert_eq!(pages[1].url, format!("{}/contact", base));

    let visited = crawler.visited();
    assert!(visited.contains(&format!("{}/", base)));
    assert!(visited.contains(&format!("{}/contact", base)));

    // The document itself shows up as response and finished request
    assert!(pages[0].has_element(&format!("{}/", base)));
    assert_eq!(pages[0].elements[0].status_code, Some(200));
    assert!(pages[0].requests[0].total_size() > 0);
}

#[tokio::test]
async fn test_download_start_url_yields_no_page() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "/report.pdf",
        ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
    )
    .await;

    let config = create_test_config();
    let start = format!("{}/report.pdf", server.uri());
    let mut crawler = Crawler::new(&start, new_fetcher(&config), &config).unwrap();

    assert!(crawler.next_page().await.is_none());
    assert_eq!(crawler.visits().len(), 1);
    assert_eq!(crawler.visits()[0].state, FetchState::SkipNoPage);
}

#[tokio::test]
async fn test_internal_redirect_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(&server, "/", html(r#"<a href="/old">Old</a>"#)).await;
    mount_get(
        &server,
        "/old",
        ResponseTemplate::new(301).insert_header("Location", "/new"),
    )
    .await;
    mount_get(&server, "/new", html("<h1>New</h1>")).await;

    let config = create_test_config();
    let mut crawler = Crawler::new(&base, new_fetcher(&config), &config).unwrap();

    let pages = collect(&mut crawler).await;
    let urls: Vec<&str> = pages.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(urls, vec![format!("{}/", base), format!("{}/new", base)]);
    assert!(crawler.visited().contains(&format!("{}/old", base)));
}

#[tokio::test]
async fn test_external_redirect_skipped() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;
    let base = server.uri();

    mount_get(&server, "/", html(r#"<a href="/away">Away</a>"#)).await;
    mount_get(
        &server,
        "/away",
        ResponseTemplate::new(302).insert_header("Location", format!("{}/landing", external.uri()).as_str()),
    )
    .await;
    mount_get(&external, "/landing", html("<h1>Elsewhere</h1>")).await;

    let config = create_test_config();
    let mut crawler = Crawler::new(&base, new_fetcher(&config), &config).unwrap();

    let pages = collect(&mut crawler).await;
    assert_eq!(pages.len(), 1);

    let away = crawler
        .visits()
        .iter()
        .find(|v| v.url == format!("{}/away", base))
        .expect("redirecting URL was attempted");
    assert_eq!(away.state, FetchState::SkipExternalRedirect);
}

#[tokio::test]
async fn test_offsite_redirect_loads_no_subresources() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_get(
        &server,
        "/away",
        ResponseTemplate::new(302).insert_header("Location", format!("{}/landing", external.uri()).as_str()),
    )
    .await;
    mount_get(
        &external,
        "/landing",
        html(r#"<html><head><script src="/tracker.js"></script></head><body></body></html>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/tracker.js"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&external)
        .await;

    let config = create_test_config();
    let mut fetcher = new_fetcher(&config);
    let mut capture = NetworkCapture::default();

    let loaded = fetcher
        .navigate(&format!("{}/away", server.uri()), &mut capture)
        .await
        .unwrap();
    assert_eq!(loaded.url, format!("{}/landing", external.uri()));

    let traffic = capture.drain();
    assert_eq!(traffic.elements.len(), 1);
    assert!(!traffic.elements.iter().any(|e| e.url.ends_with("/tracker.js")));
}

#[tokio::test]
async fn test_navigation_error_skipped() {
    let config = create_test_config();
    let mut crawler =
        Crawler::new("http://127.0.0.1:1/", new_fetcher(&config), &config).unwrap();

    assert!(crawler.next_page().await.is_none());
    assert_eq!(crawler.visits()[0].state, FetchState::SkipNavigationError);
}

#[tokio::test]
async fn test_favicon_found_and_missing() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html(r#"<html><head><link rel="icon" href="/favicon.ico"></head><body><a href="/other">x</a></body></html>"#),
    )
    .await;
    mount_get(
        &server,
        "/other",
        html(r#"<html><head><link rel="shortcut icon" href="/missing.ico"></head><body></body></html>"#),
    )
    .await;
    mount_get(
        &server,
        "/favicon.ico",
        ResponseTemplate::new(200).set_body_raw(vec![0u8, 0, 1, 0], "image/x-icon"),
    )
    .await;
    mount_get(&server, "/missing.ico", ResponseTemplate::new(404)).await;

    let config = create_test_config();
    let mut crawler = Crawler::new(&base, new_fetcher(&config), &config).unwrap();

    let pages = collect(&mut crawler).await;
    assert_eq!(pages.len(), 2);

    let favicon = format!("{}/favicon.ico", base);
    let icon = pages[0]
        .elements
        .iter()
        .find(|e| e.url == favicon)
        .expect("favicon recorded as resource");
    assert_eq!(icon.status_code, Some(200));
    assert_eq!(icon.header("content-type"), Some("image/x-icon"));

    assert!(pages[1].has_failed_request(&format!("{}/missing.ico", base)));
}

#[tokio::test]
async fn test_favicon_probe_does_not_follow_redirects() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "/favicon.ico",
        ResponseTemplate::new(301).insert_header("Location", "/real.ico"),
    )
    .await;
    mount_get(
        &server,
        "/real.ico",
        ResponseTemplate::new(200).set_body_raw(vec![0u8], "image/x-icon"),
    )
    .await;

    let probe = FaviconProbe::new(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();

    let outcome = probe.probe(&format!("{}/favicon.ico", server.uri())).await;
    assert_eq!(
        outcome,
        ProbeOutcome::Missing {
            reason: "HTTP 301".to_string()
        }
    );

    let outcome = probe.probe(&format!("{}/real.ico", server.uri())).await;
    assert!(matches!(outcome, ProbeOutcome::Found { .. }));
}

#[tokio::test]
async fn test_subresources_captured() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html(r#"<html><head><script src="/app.js"></script></head><body><img src="/gone.png"></body></html>"#),
    )
    .await;
    mount_get(
        &server,
        "/app.js",
        ResponseTemplate::new(200).set_body_raw("console.log(1);".to_string(), "application/javascript"),
    )
    .await;
    mount_get(&server, "/gone.png", ResponseTemplate::new(404)).await;

    let config = create_test_config();
    let mut fetcher = new_fetcher(&config);
    let mut capture = NetworkCapture::default();

    let loaded = fetcher.navigate(&format!("{}/", base), &mut capture).await.unwrap();
    assert_eq!(loaded.url, format!("{}/", base));

    let traffic = capture.drain();
    assert_eq!(traffic.elements.len(), 3);
    let gone = traffic
        .elements
        .iter()
        .find(|e| e.url.ends_with("/gone.png"))
        .unwrap();
    assert_eq!(gone.status_code, Some(404));
    assert_eq!(traffic.requests.len(), 3);
    assert!(traffic.downloads.is_empty());
}

#[tokio::test]
async fn test_cookies_recorded() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "/",
        html("<h1>Tracked</h1>").insert_header("Set-Cookie", "tracker=abc; Path=/"),
    )
    .await;

    let config = create_test_config();
    let mut crawler = Crawler::new(&server.uri(), new_fetcher(&config), &config).unwrap();

    let page = crawler.next_page().await.unwrap();
    assert_eq!(page.cookies.len(), 1);
    assert_eq!(page.cookies[0].name, "tracker");
    assert_eq!(page.cookies[0].value, "abc");

    let evaluation = Analyzer::default().run(&page);
    let cookies = evaluation
        .results
        .iter()
        .find(|r| r.title == "Cookie without consent")
        .unwrap();
    assert_eq!(cookies.status, Status::Warning);
}

#[tokio::test]
async fn test_run_crawl_report_and_persistence() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_get(
        &server,
        "/",
        html(r#"<html><head><title>Home</title></head><body><h1>Home</h1><a href="/a">A</a><a href="/b">B</a><a href="/photo.jpg">Photo</a></body></html>"#),
    )
    .await;
    mount_get(&server, "/a", html("<title>A</title><h1>A</h1>")).await;
    mount_get(&server, "/b", html("<title>B</title><h2>No h1</h2>")).await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("checker.db");
    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let run_id = storage.create_run(&base, "test").unwrap();

    let mut config = create_test_config();
    config.crawler.max_pages = Some(2);

    let outcome = run_crawl(
        &base,
        &config,
        new_fetcher(&config),
        &Analyzer::default(),
        Some(RunStorage {
            storage: &mut storage,
            run_id,
        }),
    )
    .await
    .unwrap();

    assert_eq!(outcome.evaluations.len(), 2);
    assert_eq!(storage.count_pages(run_id).unwrap(), 2);
    assert_eq!(storage.load_pages(run_id).unwrap()[0].title, "Home");
    assert_eq!(
        storage.visit_summary(run_id).unwrap().get(&FetchState::Success),
        Some(&2)
    );

    let report = build_report(outcome.evaluations).unwrap();
    assert_eq!(report.url, format!("{}/", base));
    assert_eq!(report.pages.len(), 2);
    let h1 = report
        .summary
        .iter()
        .find(|s| s.title == "H1 Headings")
        .unwrap();
    assert_eq!(h1.status, Status::Ok);

    let markdown = format_markdown_report(&report);
    assert!(markdown.contains("| H1 Headings | OK |"));
}

#[tokio::test]
async fn test_run_crawl_without_pages_is_not_an_error() {
    let server = MockServer::start().await;

    mount_get(
        &server,
        "/archive.zip",
        ResponseTemplate::new(200).set_body_raw(vec![0x50u8, 0x4b], "application/zip"),
    )
    .await;

    let config = create_test_config();
    let start = format!("{}/archive.zip", server.uri());
    let outcome = run_crawl(&start, &config, new_fetcher(&config), &Analyzer::default(), None)
        .await
        .unwrap();

    assert!(outcome.evaluations.is_empty());
    assert_eq!(outcome.skipped(), 1);
    assert!(build_report(outcome.evaluations).is_err());
}
