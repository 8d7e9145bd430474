//! Crawl request parameters and their wire payloads

use crate::config::ScrapeConfig;
use crate::SubmitError;
use serde::Serialize;
use url::Url;

/// Largest page limit accepted for a single crawl job
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Whether the service should seed the crawl from the site's sitemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SitemapMode {
    Include,
    Exclude,
}

impl From<bool> for SitemapMode {
    fn from(include: bool) -> Self {
        if include {
            Self::Include
        } else {
            Self::Exclude
        }
    }
}

/// The options captured from the caller for one crawl job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Starting URL of the crawl
    pub url: String,

    /// Maximum number of pages the service may crawl (1..=50)
    pub limit: u32,

    /// Follow links to any path on the domain, not only below the start URL
    pub crawl_entire_domain: bool,

    /// Seed the crawl from the sitemap as well as from links
    pub include_sitemap: bool,

    /// Strip navigation, headers and footers from extracted content
    pub only_main_content: bool,
}

impl CrawlRequest {
    /// Creates a request with the front-end's default flags
    pub fn new(url: impl Into<String>, limit: u32) -> Self {
        Self {
            url: url.into(),
            limit,
            crawl_entire_domain: false,
            include_sitemap: false,
            only_main_content: true,
        }
    }

    pub fn crawl_entire_domain(mut self, enabled: bool) -> Self {
        self.crawl_entire_domain = enabled;
        self
    }

    pub fn include_sitemap(mut self, enabled: bool) -> Self {
        self.include_sitemap = enabled;
        self
    }

    pub fn only_main_content(mut self, enabled: bool) -> Self {
        self.only_main_content = enabled;
        self
    }

    /// Checks the request before any network call is made
    pub fn validate(&self) -> Result<(), SubmitError> {
        validate_target_url(&self.url)?;

        if self.limit < 1 || self.limit > MAX_PAGE_LIMIT {
            return Err(SubmitError::InvalidRequest(format!(
                "page limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT, self.limit
            )));
        }

        Ok(())
    }

    /// Builds the `POST /v2/crawl` body for this request
    ///
    /// The URL is sent trimmed, exactly as `validate` checked it.
    pub fn payload<'a>(&'a self, scrape: &'a ScrapeConfig) -> CrawlPayload<'a> {
        CrawlPayload {
            url: self.url.trim(),
            sitemap: SitemapMode::from(self.include_sitemap),
            crawl_entire_domain: self.crawl_entire_domain,
            limit: self.limit,
            scrape_options: ScrapeOptions::new(self.only_main_content, scrape),
        }
    }
}

/// Checks that a target URL is non-empty and uses http or https
///
/// Returns the trimmed URL; that is the value to put on the wire.
pub fn validate_target_url(target: &str) -> Result<&str, SubmitError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::InvalidRequest(
            "target URL cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(trimmed).map_err(|e| {
        SubmitError::InvalidRequest(format!("invalid target URL '{}': {}", target, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SubmitError::InvalidRequest(format!(
            "target URL must use http or https, got '{}'",
            target
        )));
    }

    Ok(trimmed)
}

/// Body of `POST /v2/crawl`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlPayload<'a> {
    pub url: &'a str,
    pub sitemap: SitemapMode,
    pub crawl_entire_domain: bool,
    pub limit: u32,
    pub scrape_options: ScrapeOptions<'a>,
}

/// Per-page extraction options shared by crawl and scrape requests
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions<'a> {
    pub only_main_content: bool,
    pub max_age: u64,
    pub parsers: &'a [String],
    pub formats: &'a [String],
}

impl<'a> ScrapeOptions<'a> {
    pub fn new(only_main_content: bool, scrape: &'a ScrapeConfig) -> Self {
        Self {
            only_main_content,
            max_age: scrape.max_age_ms,
            parsers: &scrape.parsers,
            formats: &scrape.formats,
        }
    }
}

/// Body of `POST /v2/scrape`
#[derive(Debug, Serialize)]
pub struct ScrapePayload<'a> {
    pub url: &'a str,
    #[serde(flatten)]
    pub options: ScrapeOptions<'a>,
}
