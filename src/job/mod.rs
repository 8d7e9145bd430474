//! Crawl job data model
//!
//! This module defines what the client sends and receives:
//! - `CrawlRequest`: the options captured for one job, and its wire payload
//! - `CrawlJobHandle`: the job identifier issued on submission
//! - `CrawlStatus`: one status query's view of the job
//! - `CrawlOutcome`: the terminal result handed back to the caller

mod request;
mod response;

pub use request::{
    validate_target_url, CrawlPayload, CrawlRequest, ScrapeOptions, ScrapePayload, SitemapMode,
    MAX_PAGE_LIMIT,
};
pub use response::{CrawlJobHandle, CrawlOutcome, CrawlStatus, Page, PollPolicy, UNKNOWN_ERROR};
