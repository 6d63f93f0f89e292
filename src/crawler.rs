//! Ingestion coordinator
//!
//! Drives the crawl as a sequential page loop: fetch the listing page at the
//! current offset, fan one enrichment task out per issue (bounded by the
//! enricher's semaphore), collect completions in arrival order, append each
//! successful record to the sink, then advance the offset by the page's
//! issue count. Offset advancement is strictly sequential across pages; the
//! write order *within* a page follows task completion and is unspecified.
//!
//! The offset advances by the number of issues in the page, not the number
//! successfully written, so a permanently failing item cannot pin the crawl
//! to one page.

use crate::api::IssueApi;
use crate::config::Config;
use crate::enrich::IssueEnricher;
use crate::error::{Error, Result};
use crate::sink::JsonlSink;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Outcome of a completed crawl
#[derive(Clone, Debug)]
pub struct CrawlSummary {
    /// Records appended to the sink by this run
    pub written: u64,
    /// Issues skipped after exhausted enrichment retries
    pub skipped: u64,
    /// Listing pages processed (successful page fetches)
    pub pages: u64,
    /// Listing offset at termination
    pub final_offset: u64,
    /// Path of the raw JSONL sink
    pub sink_path: PathBuf,
}

/// Crawls one project's issues into an append-only JSONL sink
pub struct Crawler {
    api: Arc<dyn IssueApi>,
    config: Config,
    project: String,
}

impl Crawler {
    /// Create a crawler for `project` (already validated and uppercased)
    pub fn new(api: Arc<dyn IssueApi>, config: Config, project: &str) -> Self {
        Self {
            api,
            config,
            project: project.to_string(),
        }
    }

    /// Run the crawl to completion
    ///
    /// Resumes from the sink's existing line count and terminates when the
    /// listing returns an empty page or the offset reaches the reported
    /// total. Page-fetch failures are retried at the same offset per the
    /// configured page retry policy; item-fetch failures are skipped.
    ///
    /// # Errors
    /// Fails on invalid configuration, an unwritable sink, or — when a page
    /// retry cap is configured — persistent page-fetch failures.
    pub async fn run(&self) -> Result<CrawlSummary> {
        self.config.validate()?;
        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let sink_path = self
            .config
            .output_dir
            .join(format!("{}_raw.jsonl", self.project));

        let resume = JsonlSink::resume_offset(&sink_path).await?;
        if resume > 0 {
            info!(
                project = %self.project,
                resumed_at = resume,
                "resuming, skipping already-persisted issues"
            );
        }
        let mut sink = JsonlSink::open(&sink_path).await?;
        let enricher = IssueEnricher::new(
            self.api.clone(),
            self.config.concurrency,
            &self.project,
            &self.config.base_url,
        );

        let mut start_at = resume;
        let mut total: Option<u64> = None;
        let mut written_total = 0u64;
        let mut skipped_total = 0u64;
        let mut pages = 0u64;
        let mut page_failures: u32 = 0;

        loop {
            let page = match self
                .api
                .search_page(&self.project, start_at, self.config.page_size)
                .await
            {
                Ok(page) => {
                    page_failures = 0;
                    page
                }
                Err(e) => {
                    page_failures += 1;
                    if let Some(cap) = self.config.page_retry.max_attempts {
                        if page_failures >= cap {
                            error!(
                                project = %self.project,
                                offset = start_at,
                                attempts = page_failures,
                                "page fetch kept failing, aborting crawl"
                            );
                            return Err(Error::PageRetriesExhausted {
                                offset: start_at,
                                attempts: page_failures,
                            });
                        }
                    }
                    warn!(
                        project = %self.project,
                        offset = start_at,
                        attempt = page_failures,
                        error = %e,
                        "page fetch failed, retrying same offset"
                    );
                    tokio::time::sleep(self.config.page_retry.delay).await;
                    continue;
                }
            };
            pages += 1;
            if total.is_none() {
                total = page.total;
            }
            if page.issues.is_empty() {
                info!(project = %self.project, "no more issues found, crawl complete");
                break;
            }

            let mut tasks = JoinSet::new();
            for summary in &page.issues {
                let enricher = enricher.clone();
                let key = summary.key.clone();
                tasks.spawn(async move { enricher.enrich(&key).await });
            }

            // Drain in completion order so one slow fetch does not hold up
            // writes for the rest of the page
            let mut written = 0u64;
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Some(record)) => {
                        debug!(issue = %record.key, "writing record");
                        sink.append(&record).await?;
                        written += 1;
                    }
                    Ok(None) => skipped_total += 1,
                    Err(e) => {
                        warn!(error = %e, "enrichment task aborted, skipping");
                        skipped_total += 1;
                    }
                }
            }

            written_total += written;
            start_at += page.issues.len() as u64;
            info!(
                project = %self.project,
                written,
                progress = start_at,
                total = total,
                "page complete"
            );

            if let Some(total) = total {
                if start_at >= total {
                    break;
                }
            }
        }

        info!(
            project = %self.project,
            written = written_total,
            skipped = skipped_total,
            sink = %sink_path.display(),
            "scraping complete"
        );
        Ok(CrawlSummary {
            written: written_total,
            skipped: skipped_total,
            pages,
            final_offset: start_at,
            sink_path,
        })
    }
}
