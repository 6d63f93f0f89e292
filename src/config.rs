//! Configuration types for jira-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Top-level crawl configuration
///
/// Every field has a sensible default so a crawl works out of the box with
/// only a project key. All knobs the pipeline uses (attempt budget, fixed
/// retry delay, enrichment concurrency, page size) live here rather than as
/// constants buried in the fetch code.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the Jira instance (default: Apache's public Jira)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory raw and processed JSONL files are written to (default: "sample_output")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Issues requested per search page (default: 30)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum concurrent enrichment fetches (default: 10)
    ///
    /// This bounds outstanding requests against the remote API; it is the
    /// only shared-resource gate in the pipeline.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout for HTTP calls (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Retry policy for individual HTTP requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Retry policy for the outer page loop
    #[serde(default)]
    pub page_retry: PageRetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            request_timeout: default_request_timeout(),
            retry: RetryConfig::default(),
            page_retry: PageRetryConfig::default(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the offending key when a value is
    /// out of range or malformed.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::config("base_url must not be empty", Some("base_url")));
        }
        if self.page_size == 0 {
            return Err(Error::config("page_size must be at least 1", Some("page_size")));
        }
        if self.concurrency == 0 {
            return Err(Error::config(
                "concurrency must be at least 1",
                Some("concurrency"),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config(
                "retry.max_attempts must be at least 1",
                Some("retry.max_attempts"),
            ));
        }
        Ok(())
    }
}

/// Fixed-delay retry policy for individual HTTP requests
///
/// The delay is deliberately constant: no exponential growth and no jitter.
/// Page and issue fetches against the tracker are cheap idempotent GETs and
/// the crawl runs unattended, so a flat delay keeps the behavior predictable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempt budget per request, including the first try (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts (default: 3 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay: default_retry_delay(),
        }
    }
}

/// Retry policy for the outer page loop
///
/// When a whole page fetch exhausts its request-level retries, the
/// coordinator re-fetches the same offset after `delay`. With
/// `max_attempts = None` (the default) it retries indefinitely, which suits
/// an unattended crawl of an eventually-available source; setting a cap
/// turns persistent page failures into a fatal
/// [`Error::PageRetriesExhausted`](crate::Error::PageRetriesExhausted).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PageRetryConfig {
    /// Delay before re-fetching a failed page (default: 3 seconds)
    #[serde(default = "default_retry_delay", with = "duration_serde")]
    pub delay: Duration,

    /// Maximum consecutive failures for one offset before aborting
    /// (default: None = retry forever)
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for PageRetryConfig {
    fn default() -> Self {
        Self {
            delay: default_retry_delay(),
            max_attempts: None,
        }
    }
}

/// Validate and normalize a Jira project key
///
/// Keys are uppercased (the tracker is case-insensitive on lookup but keys
/// in issue identifiers are canonically upper case) and must be ASCII
/// alphanumeric starting with a letter, e.g. `HADOOP` or `LOG4J2`.
///
/// # Errors
/// Returns [`Error::Config`] when the key is empty or contains characters
/// outside `[A-Z][A-Z0-9]*`.
pub fn normalize_project_key(key: &str) -> Result<String> {
    let key = key.trim().to_ascii_uppercase();
    let valid = !key.is_empty()
        && key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && key.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(Error::config(
            format!("invalid project key {key:?}: expected e.g. HADOOP or KAFKA"),
            Some("project"),
        ));
    }
    Ok(key)
}

fn default_base_url() -> String {
    "https://issues.apache.org/jira".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("sample_output")
}

fn default_page_size() -> usize {
    30
}

fn default_concurrency() -> usize {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(3)
}

// Duration serialization helper (stores seconds as integer)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
