//! Client module for the remote crawl-job API
//!
//! This module contains everything that talks to the service:
//! - Submitting crawl jobs and single-page scrapes
//! - Querying job status
//! - Polling a job to its terminal outcome

mod api;
mod poller;

pub use api::{build_http_client, CrawlClient, ScrapedPage};
pub use poller::{NoopObserver, PollObserver, PollProgress};
