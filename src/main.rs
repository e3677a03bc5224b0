//! Website Checker main entry point
//!
//! This is the command-line interface for the Website Checker audit crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use website_checker::analyze::Analyzer;
use website_checker::config::{load_config_or_default, validate, validate_start_url, Config};
use website_checker::crawler::{run_crawl, HttpFetcher, RunStorage};
use website_checker::report::{build_report, write_markdown_report};
use website_checker::storage::{open_storage, RunStatus, Storage};
use website_checker::FetchState;

/// Website Checker: audit every page of a website
///
/// Crawls all internal pages reachable from the given URL, records the network
/// traffic of each page, runs a set of checks and writes a markdown report.
#[derive(Parser, Debug)]
#[command(name = "website-checker")]
#[command(version)]
#[command(about = "Crawl a website and audit every page", long_about = None)]
struct Cli {
    /// URL of the website to check (https:// is assumed when no scheme is given)
    #[arg(value_name = "URL", required_unless_present_any = ["stats", "export_report"])]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum time between two page loads in milliseconds
    #[arg(short, long, value_name = "MS")]
    rate_limit: Option<u64>,

    /// Maximum number of pages to check
    #[arg(short = 'p', long, value_name = "N")]
    max_pages: Option<u32>,

    /// Follow links to subdomains of the website
    #[arg(long)]
    allow_subdomains: bool,

    /// Save the crawled pages to the database
    #[arg(short, long)]
    save: bool,

    /// Path of the markdown report
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_report"])]
    dry_run: bool,

    /// Show visit statistics of the latest saved run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_report"])]
    stats: bool,

    /// Rebuild the report from the latest saved run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) =
        load_config_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded (hash: {})", hash);
    }

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;

    if cli.stats {
        return handle_stats(&config);
    }
    if cli.export_report {
        return handle_export_report(&config);
    }

    let url = cli
        .url
        .as_deref()
        .map(with_scheme)
        .context("A URL is required")?;
    validate_start_url(&url)?;

    if cli.dry_run {
        handle_dry_run(&config, &url);
        return Ok(());
    }

    handle_crawl(&config, &url, config_hash.as_deref().unwrap_or("default")).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("website_checker=info,warn"),
            1 => EnvFilter::new("website_checker=debug,info"),
            2 => EnvFilter::new("website_checker=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command line flags take precedence over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(rate_limit) = cli.rate_limit {
        config.crawler.rate_limit_ms = rate_limit;
    }
    if cli.max_pages.is_some() {
        config.crawler.max_pages = cli.max_pages;
    }
    if cli.allow_subdomains {
        config.crawler.allow_subdomains = true;
    }
    if cli.save {
        config.output.save_pages = true;
    }
    if let Some(output) = &cli.output {
        config.output.report_path = output.display().to_string();
    }
}

/// Prepends `https://` to a URL given without scheme
fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, url: &str) {
    println!("=== Website Checker Dry Run ===\n");

    println!("Target: {}", url);

    println!("\nCrawler Configuration:");
    println!("  Rate limit: {}ms", config.crawler.rate_limit_ms);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unlimited"),
    }
    println!("  Allow subdomains: {}", config.crawler.allow_subdomains);
    println!(
        "  Navigation timeout: {}s",
        config.crawler.navigation_timeout_secs
    );
    println!("  Fetch sub-resources: {}", config.crawler.fetch_subresources);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Report: {}", config.output.report_path);
    if config.output.save_pages {
        println!("  Database: {}", config.output.database_path);
    }

    println!("\nChecks:");
    match &config.checks.cookie_database {
        Some(path) => println!("  Cookie database: {}", path),
        None => println!("  Cookie database: none"),
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Checks: {}", Analyzer::default().titles().join(", "));
}

/// Handles the --stats mode: shows visit statistics of the latest run
fn handle_stats(config: &Config) -> Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let run = storage
        .get_latest_run()?
        .context("No saved run found in database")?;

    println!("Run {} of {}", run.id, run.start_url);
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Status: {}", run.status.to_db_string());
    println!("  Pages saved: {}", storage.count_pages(run.id)?);

    let summary = storage.visit_summary(run.id)?;
    println!("\nVisits:");
    for state in FetchState::all_states() {
        if let Some(count) = summary.get(&state) {
            println!("  {:<24} {}", state.to_string(), count);
        }
    }

    Ok(())
}

/// Handles the --export-report mode: rebuilds the report from saved pages
fn handle_export_report(config: &Config) -> Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let run = storage
        .get_latest_run()?
        .context("No saved run found in database")?;

    tracing::info!("Loading pages of run {} from database...", run.id);
    let pages = storage.load_pages(run.id)?;
    if pages.is_empty() {
        println!("Nothing to report: run {} has no saved pages", run.id);
        return Ok(());
    }

    let analyzer =
        Analyzer::from_config(&config.checks).context("Failed to load cookie database")?;
    let evaluations = pages.iter().map(|page| analyzer.run(page)).collect();
    let report = build_report(evaluations)?;
    write_markdown_report(&report, Path::new(&config.output.report_path))?;

    println!("✓ Report exported to: {}", config.output.report_path);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, url: &str, config_hash: &str) -> Result<()> {
    let analyzer =
        Analyzer::from_config(&config.checks).context("Failed to load cookie database")?;

    let mut storage = if config.output.save_pages {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        tracing::info!("Saving pages to {}", config.output.database_path);
        Some(storage)
    } else {
        None
    };

    let run_id = match storage.as_mut() {
        Some(storage) => Some(storage.create_run(url, config_hash)?),
        None => None,
    };

    let target = match (storage.as_mut(), run_id) {
        (Some(storage), Some(run_id)) => Some(RunStorage {
            storage: storage as &mut dyn Storage,
            run_id,
        }),
        _ => None,
    };

    let outcome = match HttpFetcher::new(&config.crawler, &config.user_agent) {
        Ok(fetcher) => run_crawl(url, config, fetcher, &analyzer, target).await,
        Err(e) => Err(e.into()),
    };

    if let (Some(storage), Some(run_id)) = (storage.as_mut(), run_id) {
        match &outcome {
            Ok(_) => storage.complete_run(run_id)?,
            Err(_) => storage.update_run_status(run_id, RunStatus::Failed)?,
        }
    }

    let outcome = outcome.context("Crawl failed")?;
    if outcome.evaluations.is_empty() {
        println!("Nothing to report: no page of {} could be loaded", url);
        return Ok(());
    }

    let pages = outcome.evaluations.len();
    let skipped = outcome.skipped();
    let report = build_report(outcome.evaluations)?;
    write_markdown_report(&report, Path::new(&config.output.report_path))?;

    println!(
        "✓ Checked {} pages ({} skipped), overall status {}",
        pages,
        skipped,
        report.overall_status()
    );
    println!("✓ Report written to: {}", config.output.report_path);

    Ok(())
}
