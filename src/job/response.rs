//! Job handles, status responses and terminal outcomes

use crate::config::PollConfig;
use crate::state::JobState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::time::Duration;

/// Message used when the service reports a failure without saying why
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Identifies a crawl job accepted by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJobHandle {
    id: String,
    issued_at: DateTime<Utc>,
}

impl CrawlJobHandle {
    /// Creates a handle stamped with the current time
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issued_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

/// One page returned by the service
///
/// Content fields are kept exactly as received: a page that only carries
/// plain text never gets a markdown value, and vice versa.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub markdown: Option<String>,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Map<String, Value>,

    /// Any other fields the service attached (links, html, warnings, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    /// The page URL, falling back to `metadata.sourceURL` or `metadata.url`
    pub fn source_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.metadata_str("sourceURL"))
            .or_else(|| self.metadata_str("url"))
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata_str("title")
    }

    /// Content to show a reader: markdown when present, otherwise plain text
    pub fn display_content(&self) -> Option<&str> {
        self.markdown.as_deref().or(self.content.as_deref())
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Treats `null` like a missing map
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Status of a crawl job as reported by one status query
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlStatus {
    /// Any non-terminal label, e.g. "queued" or "scraping"
    InProgress { label: String },
    Completed { pages: Vec<Page> },
    Failed { error: String },
}

#[derive(Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    data: Option<Vec<Page>>,
    #[serde(default)]
    error: Option<Value>,
}

/// Pulls a readable message out of the `error` field
///
/// Accepts a plain string or an object carrying a string `message`.
fn error_message(error: Option<&Value>) -> Option<String> {
    let message = match error? {
        Value::String(message) => message.as_str(),
        Value::Object(fields) => fields.get("message")?.as_str()?,
        _ => return None,
    };
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

impl CrawlStatus {
    /// Interprets a `GET /v2/crawl/{id}` response body
    ///
    /// A completed body without `data` yields an empty page list.
    pub fn from_response(body: &Value) -> Result<Self, String> {
        let parsed = StatusBody::deserialize(body).map_err(|e| e.to_string())?;

        Ok(match parsed.status.as_str() {
            "completed" => Self::Completed {
                pages: parsed.data.unwrap_or_default(),
            },
            "failed" => Self::Failed {
                error: error_message(parsed.error.as_ref())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            },
            _ => Self::InProgress {
                label: parsed.status,
            },
        })
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress { .. })
    }

    /// The raw status label this value was built from
    pub fn label(&self) -> &str {
        match self {
            Self::InProgress { label } => label,
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Terminal result of driving a job to completion
#[derive(Debug, Clone)]
pub enum CrawlOutcome {
    /// The service finished the job
    Success { pages: Vec<Page>, raw: Value },

    /// The service reported the job as failed
    Failure { message: String, raw: Value },

    /// The poll budget ran out; the job may still be running server-side
    TimedOut {
        handle: CrawlJobHandle,
        attempts: u32,
        /// Total wait the poll policy allowed
        budget: Duration,
        last_status: Option<String>,
        raw: Option<Value>,
    },
}

impl CrawlOutcome {
    pub fn state(&self) -> JobState {
        match self {
            Self::Success { .. } => JobState::Completed,
            Self::Failure { .. } => JobState::Failed,
            Self::TimedOut { .. } => JobState::TimedOut,
        }
    }

    /// The last status payload received, for diagnostics
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Self::Success { raw, .. } | Self::Failure { raw, .. } => Some(raw),
            Self::TimedOut { raw, .. } => raw.as_ref(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        match self {
            Self::Success { pages, .. } => pages,
            _ => &[],
        }
    }
}

/// Cadence and cap for status polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed wait between two consecutive status queries
    pub interval: Duration,

    /// Maximum number of status queries
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time the poller will wait before reporting a timeout
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&PollConfig::default())
    }
}

impl From<&PollConfig> for PollPolicy {
    fn from(config: &PollConfig) -> Self {
        Self::new(
            Duration::from_secs(config.interval_secs),
            config.max_attempts,
        )
    }
}
