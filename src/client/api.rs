//! HTTP calls to the crawl service
//!
//! This module handles every request the client makes:
//! - Building the HTTP client with a per-request timeout
//! - `POST /v2/crawl` to submit a job
//! - `GET /v2/crawl/{id}` to query a job's status
//! - `POST /v2/scrape` to extract a single page synchronously
//!
//! Each request is independent; nothing is held open between polls.

use crate::config::{resolve_api_key, ApiConfig, ApiKey, Config, ScrapeConfig};
use crate::job::{
    validate_target_url, CrawlJobHandle, CrawlRequest, CrawlStatus, Page, ScrapeOptions,
    ScrapePayload,
};
use crate::{ConfigError, PollError, PollResult, SubmitError, SubmitResult};
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// A single page returned by the scrape endpoint
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub page: Page,
    /// Full response body, for diagnostics
    pub raw: Value,
}

/// Client for the remote crawl-job API
///
/// All settings are captured at construction; there is no shared global
/// state, so independent jobs can run on separate clients (or clones).
#[derive(Debug, Clone)]
pub struct CrawlClient {
    http: Client,
    base_url: Url,
    api_key: Option<ApiKey>,
    api_key_env: String,
    scrape: ScrapeConfig,
}

/// Builds an HTTP client for the crawl service
///
/// # Arguments
///
/// * `config` - The API connection settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(config.request_timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

impl CrawlClient {
    /// Creates a client from explicit settings and an optional credential
    ///
    /// A missing credential is not an error here; every call checks for it
    /// and fails with a configuration error before touching the network.
    pub fn new(config: &Config, api_key: Option<ApiKey>) -> Result<Self, ConfigError> {
        let http = build_http_client(&config.api)
            .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.api.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "base-url cannot carry a path: {}",
                config.api.base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            api_key,
            api_key_env: config.api.api_key_env.clone(),
            scrape: config.scrape.clone(),
        })
    }

    /// Creates a client whose credential is read from the environment
    ///
    /// Fails immediately if the credential is absent.
    pub fn from_env(config: &Config) -> Result<Self, ConfigError> {
        let api_key = resolve_api_key(&config.api)?;
        Self::new(config, Some(api_key))
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn credential(&self) -> Result<&ApiKey, ConfigError> {
        self.api_key
            .as_ref()
            .ok_or_else(|| ConfigError::MissingCredential {
                var: self.api_key_env.clone(),
            })
    }

    /// Submits a crawl job
    ///
    /// The payload is serialized once from `request`; later changes to the
    /// caller's copy cannot affect the submitted job.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlJobHandle)` - The service accepted the job
    /// * `Err(SubmitError::Config)` - No credential; no request was sent
    /// * `Err(SubmitError::InvalidRequest)` - Bad URL or limit; no request was sent
    /// * `Err(SubmitError::Transport)` - Network failure or timeout
    /// * `Err(SubmitError::Remote)` - Non-2xx response
    /// * `Err(SubmitError::Protocol)` - 2xx response without a job id
    pub async fn submit(&self, request: &CrawlRequest) -> SubmitResult<CrawlJobHandle> {
        let key = self.credential()?;
        request.validate()?;

        let url = self.endpoint(&["v2", "crawl"]);
        tracing::info!(
            "Submitting crawl of {} (limit {}, entire domain: {}, sitemap: {})",
            request.url.trim(),
            request.limit,
            request.crawl_entire_domain,
            request.include_sitemap
        );

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(key.expose())
            .json(&request.payload(&self.scrape))
            .send()
            .await
            .map_err(|source| SubmitError::Transport {
                url: url.to_string(),
                source,
            })?;

        let body = success_body(response, url.as_str()).await?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SubmitError::Protocol {
                endpoint: url.to_string(),
                message: "response has no job id".to_string(),
            })?;

        tracing::info!("Crawl job {} accepted", id);
        Ok(CrawlJobHandle::new(id))
    }

    /// Queries the job status once
    ///
    /// Returns the interpreted status alongside the raw response body. The
    /// job id is sent as a single path segment; ids that cannot be one
    /// (empty, `.` or `..`) are rejected without a request.
    pub async fn check_status(&self, handle: &CrawlJobHandle) -> PollResult<(CrawlStatus, Value)> {
        let key = self.credential()?;
        let id = handle.id();
        if matches!(id, "" | "." | "..") {
            return Err(PollError::InvalidJobId {
                job_id: id.to_string(),
            });
        }
        let url = self.endpoint(&["v2", "crawl", id]);

        let response = self
            .http
            .get(url.clone())
            .bearer_auth(key.expose())
            .send()
            .await
            .map_err(|source| PollError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PollError::StatusQueryFailed {
                job_id: handle.id().to_string(),
                status_code: status.as_u16(),
                body,
            });
        }

        let raw: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                PollError::Protocol {
                    job_id: handle.id().to_string(),
                    message: format!("body is not JSON: {}", e),
                }
            } else {
                PollError::Transport {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let crawl_status =
            CrawlStatus::from_response(&raw).map_err(|message| PollError::Protocol {
                job_id: handle.id().to_string(),
                message,
            })?;

        Ok((crawl_status, raw))
    }

    /// Scrapes a single page without creating a crawl job
    pub async fn scrape(&self, target: &str, only_main_content: bool) -> SubmitResult<ScrapedPage> {
        let key = self.credential()?;
        let target = validate_target_url(target)?;

        let url = self.endpoint(&["v2", "scrape"]);
        tracing::info!("Scraping {}", target);

        let payload = ScrapePayload {
            url: target,
            options: ScrapeOptions::new(only_main_content, &self.scrape),
        };

        let response = self
            .http
            .post(url.clone())
            .bearer_auth(key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|source| SubmitError::Transport {
                url: url.to_string(),
                source,
            })?;

        let raw = success_body(response, url.as_str()).await?;

        if raw.get("success").and_then(Value::as_bool) == Some(false) {
            let message = raw
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("service reported success=false")
                .to_string();
            return Err(SubmitError::Protocol {
                endpoint: url.to_string(),
                message,
            });
        }

        let data = raw.get("data").cloned().ok_or_else(|| SubmitError::Protocol {
            endpoint: url.to_string(),
            message: "response has no data".to_string(),
        })?;
        let page: Page = serde_json::from_value(data).map_err(|e| SubmitError::Protocol {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(ScrapedPage { page, raw })
    }
}

/// Returns the JSON body of a 2xx response, or the matching error
async fn success_body(response: Response, url: &str) -> SubmitResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("{} returned HTTP {}", url, status);
        return Err(SubmitError::Remote {
            status_code: status.as_u16(),
            body,
        });
    }

    response.json().await.map_err(|e| {
        if e.is_decode() {
            SubmitError::Protocol {
                endpoint: url.to_string(),
                message: format!("body is not JSON: {}", e),
            }
        } else {
            SubmitError::Transport {
                url: url.to_string(),
                source: e,
            }
        }
    })
}
