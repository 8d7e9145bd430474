//! Crawl-Pilot: a client for a remote crawl-job API
//!
//! This crate submits crawl jobs to a hosted crawling service, polls the job
//! until it reaches a terminal status, and renders the returned pages.

pub mod client;
pub mod config;
pub mod job;
pub mod output;
pub mod state;

use thiserror::Error;

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing API credential: set {var} in the environment or a .env file")]
    MissingCredential { var: String },
}

/// Errors returned when submitting a crawl job or scraping a single page
#[derive(Debug, Error)]
pub enum SubmitError {
    /// No usable credential; no request was sent
    #[error("Authentication not configured: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Remote service returned HTTP {status_code}: {body}")]
    Remote { status_code: u16, body: String },

    #[error("Unexpected response from {endpoint}: {message}")]
    Protocol { endpoint: String, message: String },
}

/// Errors that abort polling before a terminal status is observed
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Authentication not configured: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Status query for job {job_id} failed with HTTP {status_code}: {body}")]
    StatusQueryFailed {
        job_id: String,
        status_code: u16,
        body: String,
    },

    #[error("Unexpected status response for job {job_id}: {message}")]
    Protocol { job_id: String, message: String },

    #[error("Job id {job_id:?} cannot be used in a status URL")]
    InvalidJobId { job_id: String },
}

/// Errors from the combined submit-then-poll operation
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Poll(#[from] PollError),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for submit operations
pub type SubmitResult<T> = std::result::Result<T, SubmitError>;

/// Result type alias for polling operations
pub type PollResult<T> = std::result::Result<T, PollError>;

// Re-export commonly used types
pub use client::{CrawlClient, PollObserver, PollProgress};
pub use config::{ApiKey, Config};
pub use job::{CrawlJobHandle, CrawlOutcome, CrawlRequest, CrawlStatus, Page, PollPolicy};
pub use state::JobState;
