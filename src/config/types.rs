use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default base URL of the hosted crawl service
pub const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Default environment variable holding the API key
pub const DEFAULT_API_KEY_ENV: &str = "FIRECRAWL_API_KEY";

/// Main configuration structure for Crawl-Pilot
///
/// Every section is optional in the TOML file; missing keys fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

/// Remote service connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the crawl service (endpoints are appended to it)
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Timeout applied to each individual HTTP request (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Name of the environment variable that holds the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Job polling cadence
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Fixed wait between two status queries (seconds)
    #[serde(rename = "interval-secs", default = "default_interval")]
    pub interval_secs: u64,

    /// Maximum number of status queries before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Scrape options sent along with every crawl or scrape request
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeConfig {
    /// Maximum age of a cached page the service may return (milliseconds)
    #[serde(rename = "max-age-ms", default = "default_max_age")]
    pub max_age_ms: u64,

    /// Document parsers to enable server-side
    #[serde(default = "default_parsers")]
    pub parsers: Vec<String>,

    /// Output formats requested for each page
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_age_ms: default_max_age(),
            parsers: default_parsers(),
            formats: default_formats(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    60
}

fn default_max_age() -> u64 {
    // two days
    172_800_000
}

fn default_parsers() -> Vec<String> {
    vec!["pdf".to_string()]
}

fn default_formats() -> Vec<String> {
    vec!["markdown".to_string()]
}

/// A bearer token for the crawl service
///
/// The key is never printed: `Debug` shows a redacted placeholder.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key, returning `None` for empty or whitespace-only input
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
