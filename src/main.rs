//! Crawl-Pilot main entry point
//!
//! This is the command-line front-end: it collects a URL and crawl options,
//! hands them to the crawl-job client, and prints the result.

use anyhow::Context;
use clap::{Parser, Subcommand};
use crawl_pilot::client::{CrawlClient, PollProgress};
use crawl_pilot::config::{load_config_or_default, Config};
use crawl_pilot::job::{CrawlJobHandle, CrawlOutcome, CrawlRequest, CrawlStatus, PollPolicy};
use crawl_pilot::output::{
    render_outcome, render_raw, render_scraped_page, write_markdown_report, RenderOptions,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Crawl-Pilot: drive hosted crawl jobs from the command line
///
/// The API key is read from FIRECRAWL_API_KEY (or the variable named by
/// `api-key-env` in the config file); a `.env` file is loaded if present.
#[derive(Parser, Debug)]
#[command(name = "crawl-pilot")]
#[command(version)]
#[command(about = "Submit crawl jobs to a hosted crawl API and show the results", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site starting from URL and wait for the result
    Crawl {
        /// URL to start crawling from
        url: String,

        /// Maximum number of pages to crawl (1-50)
        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Crawl the entire domain, not only paths below URL
        #[arg(long)]
        entire_domain: bool,

        /// Also discover pages through the site's sitemap
        #[arg(long)]
        include_sitemap: bool,

        /// Keep navigation, headers and footers in extracted content
        #[arg(long)]
        full_page: bool,

        /// Seconds between status checks (overrides the config file)
        #[arg(long)]
        interval: Option<u64>,

        /// Maximum number of status checks (overrides the config file)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Print full page content instead of a preview
        #[arg(long)]
        full: bool,

        /// Print the raw JSON response after the result
        #[arg(long)]
        raw: bool,

        /// Also write a markdown report to this file
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Scrape a single page without starting a crawl job
    Scrape {
        /// URL of the page
        url: String,

        /// Keep navigation, headers and footers in extracted content
        #[arg(long)]
        full_page: bool,

        /// Print the raw JSON response after the result
        #[arg(long)]
        raw: bool,
    },

    /// Check the status of an earlier crawl job once
    Status {
        /// Job identifier printed when the job was submitted
        job_id: String,

        /// Print the raw JSON response
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("Failed to load configuration from {}", path.display()),
            None => "Invalid default configuration".to_string(),
        }
    })?;

    // The credential is checked here, before any request is built
    let client = CrawlClient::from_env(&config)?;

    match cli.command {
        Command::Crawl {
            url,
            limit,
            entire_domain,
            include_sitemap,
            full_page,
            interval,
            max_attempts,
            full,
            raw,
            report,
        } => {
            let request = CrawlRequest::new(url, limit)
                .crawl_entire_domain(entire_domain)
                .include_sitemap(include_sitemap)
                .only_main_content(!full_page);
            let policy = poll_policy(&config, interval, max_attempts);
            let options = RenderOptions {
                preview_chars: if full {
                    None
                } else {
                    RenderOptions::default().preview_chars
                },
                include_raw: raw,
            };
            handle_crawl(&client, request, policy, &options, report).await
        }
        Command::Scrape {
            url,
            full_page,
            raw,
        } => {
            let scraped = client.scrape(&url, !full_page).await?;
            let options = RenderOptions {
                preview_chars: None,
                include_raw: raw,
            };
            print!("{}", render_scraped_page(&scraped, &options));
            Ok(())
        }
        Command::Status { job_id, raw } => handle_status(&client, job_id, raw).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawl_pilot=info,warn"),
            1 => EnvFilter::new("crawl_pilot=debug,info"),
            2 => EnvFilter::new("crawl_pilot=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

fn poll_policy(config: &Config, interval: Option<u64>, max_attempts: Option<u32>) -> PollPolicy {
    let mut policy = PollPolicy::from(&config.poll);
    if let Some(secs) = interval {
        policy.interval = Duration::from_secs(secs.max(1));
    }
    if let Some(attempts) = max_attempts {
        policy.max_attempts = attempts.max(1);
    }
    policy
}

/// Handles the crawl command: submit, poll, render
async fn handle_crawl(
    client: &CrawlClient,
    request: CrawlRequest,
    policy: PollPolicy,
    options: &RenderOptions,
    report: Option<PathBuf>,
) -> anyhow::Result<()> {
    let handle = client.submit(&request).await?;
    println!("Submitted crawl job {}", handle.id());

    let observer = |progress: &PollProgress| {
        tracing::info!(
            "Job {}: {} (check {}/{})",
            progress.job_id,
            progress.label,
            progress.attempt,
            progress.max_attempts
        );
    };

    // Ctrl-C abandons the job on our side only; the service keeps running it
    let outcome = tokio::select! {
        result = client.poll_until_terminal(&handle, policy, &observer) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; job {} may still be running", handle.id());
            println!(
                "Stopped waiting. Check the job later with `crawl-pilot status {}`.",
                handle.id()
            );
            return Ok(());
        }
    };

    print!("{}", render_outcome(&outcome, options));

    if let Some(path) = report {
        write_markdown_report(&outcome, &request.url, &path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        println!("✓ Report written to: {}", path.display());
    }

    if let CrawlOutcome::Failure { message, .. } = &outcome {
        anyhow::bail!("crawl job {} failed: {}", handle.id(), message);
    }

    Ok(())
}

/// Handles the status command: a single status query
async fn handle_status(client: &CrawlClient, job_id: String, raw: bool) -> anyhow::Result<()> {
    let handle = CrawlJobHandle::new(job_id);
    let (status, body) = client.check_status(&handle).await?;

    match &status {
        CrawlStatus::InProgress { label } => println!("Job {} is {}", handle.id(), label),
        CrawlStatus::Completed { pages } => {
            println!("Job {} completed with {} pages", handle.id(), pages.len())
        }
        CrawlStatus::Failed { error } => println!("Job {} failed: {}", handle.id(), error),
    }

    if !status.is_terminal() {
        println!(
            "The job is still running; check again later with `crawl-pilot status {}`.",
            handle.id()
        );
    }

    if raw {
        println!("{}", render_raw(&body));
    }

    Ok(())
}
