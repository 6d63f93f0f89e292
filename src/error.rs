//! Error types for jira-harvest
//!
//! The crawl distinguishes three failure classes:
//! - transient fetch failures, retried by [`crate::retry`] up to the attempt budget
//! - per-item enrichment failures, logged and skipped by the coordinator
//! - fatal failures (bad configuration, unwritable sink, exhausted page
//!   retries when a cap is configured) that abort the run

use thiserror::Error;

/// Result type alias for jira-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for jira-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "project")
        key: Option<String>,
    },

    /// A fetch failed after the full retry budget was consumed
    ///
    /// `status` is the HTTP status of the last attempt, when the last attempt
    /// got far enough to receive one.
    #[error("fetch failed for {url}: {message}")]
    FetchFailed {
        /// The URL that was requested
        url: String,
        /// HTTP status code of the last response, if any
        status: Option<u16>,
        /// Description of the last error
        message: String,
    },

    /// Page fetches at one offset kept failing and the configured cap was hit
    #[error("page fetch at offset {offset} failed {attempts} times, giving up")]
    PageRetriesExhausted {
        /// Listing offset that could not be fetched
        offset: u64,
        /// Number of page-level attempts made
        attempts: u32,
    },

    /// Transport-level error from the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (sink open/write, transform input)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed URL when building an endpoint
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Construct a configuration error
    pub fn config(message: impl Into<String>, key: Option<&str>) -> Self {
        Error::Config {
            message: message.into(),
            key: key.map(String::from),
        }
    }
}
