//! # jira-harvest
//!
//! Resumable crawler for Jira-style issue trackers that persists issues as
//! append-only line-delimited JSON and post-processes them into a normalized
//! dataset.
//!
//! ## Design Philosophy
//!
//! - **Resumable by construction** - the sink's line count *is* the crawl
//!   offset; a restarted process picks up where the file ends, with no
//!   separate state store
//! - **Bounded against the remote** - a single semaphore caps outstanding
//!   enrichment fetches; it is the only shared-resource gate in the pipeline
//! - **Partial failure tolerant** - a permanently failing issue is logged and
//!   skipped; the page and the crawl keep going
//! - **At-least-once, not exactly-once** - records are flushed per line; a
//!   crash can tear the last line, never an earlier one
//!
//! ## Quick Start
//!
//! ```no_run
//! use jira_harvest::{Config, Crawler, HttpClient, JiraClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let http = HttpClient::new(config.request_timeout, config.retry.clone())?;
//!     let api = Arc::new(JiraClient::new(&config.base_url, http)?);
//!
//!     let summary = Crawler::new(api, config, "HADOOP").run().await?;
//!     println!("wrote {} issues", summary.written);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote tracker API trait and Jira implementation
pub mod api;
/// Tabular cleaning/deduplication pass
pub mod clean;
/// Retrying HTTP client
pub mod client;
/// Configuration types
pub mod config;
/// Ingestion coordinator
pub mod crawler;
/// Semaphore-gated per-issue enrichment
pub mod enrich;
/// Error types
pub mod error;
/// Fixed-delay retry logic
pub mod retry;
/// Checkpointed JSONL sink
pub mod sink;
/// Raw-to-processed transform
pub mod transform;
/// Wire and record types
pub mod types;

pub use api::{IssueApi, JiraClient};
pub use client::HttpClient;
pub use config::{Config, PageRetryConfig, RetryConfig, normalize_project_key};
pub use crawler::{CrawlSummary, Crawler};
pub use enrich::IssueEnricher;
pub use error::{Error, Result};
pub use sink::JsonlSink;
pub use types::{IssueRecord, SearchPage};
