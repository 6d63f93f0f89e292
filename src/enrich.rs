//! Per-issue enrichment fetch under a bounded concurrency gate
//!
//! One [`IssueEnricher`] is shared by all enrichment tasks of a crawl. Its
//! semaphore bounds how many detail fetches may be outstanding at once,
//! protecting the remote API from overload; it guards no in-process state.

use crate::api::IssueApi;
use crate::types::IssueRecord;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Expands a bare issue key into a full [`IssueRecord`]
#[derive(Clone)]
pub struct IssueEnricher {
    api: Arc<dyn IssueApi>,
    gate: Arc<Semaphore>,
    project: String,
    base_url: String,
}

impl IssueEnricher {
    /// Create an enricher with `permits` concurrent fetch slots
    pub fn new(api: Arc<dyn IssueApi>, permits: usize, project: &str, base_url: &str) -> Self {
        Self {
            api,
            gate: Arc::new(Semaphore::new(permits)),
            project: project.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Fetch full detail for `key` and build the persisted record
    ///
    /// Suspends until a semaphore slot is free, holds it for the duration of
    /// the fetch, and releases it before extraction. A fetch that fails after
    /// the client's retries is a non-fatal, per-item failure: it is logged
    /// with the issue key and `None` is returned; the coordinator neither
    /// retries it nor aborts the page.
    pub async fn enrich(&self, key: &str) -> Option<IssueRecord> {
        let permit = match self.gate.clone().acquire_owned().await {
            Ok(permit) => permit,
            // Semaphore closed — only possible during shutdown
            Err(_) => return None,
        };
        let fetched = self.api.issue_detail(key).await;
        drop(permit);

        match fetched {
            Ok(detail) => Some(IssueRecord::from_detail(
                &detail,
                key,
                &self.project,
                &self.base_url,
            )),
            Err(e) => {
                warn!(issue = key, error = %e, "failed to fetch issue, skipping");
                None
            }
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::{IssueDetail, SearchPage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fake API that tracks the concurrent-call high-water mark
    struct GaugedApi {
        current: AtomicUsize,
        high_water: AtomicUsize,
    }

    #[async_trait]
    impl IssueApi for GaugedApi {
        async fn search_page(&self, _: &str, _: u64, _: usize) -> Result<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn issue_detail(&self, key: &str) -> Result<IssueDetail> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(IssueDetail {
                key: Some(key.to_string()),
                fields: None,
            })
        }
    }

    struct FailingApi;

    #[async_trait]
    impl IssueApi for FailingApi {
        async fn search_page(&self, _: &str, _: u64, _: usize) -> Result<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn issue_detail(&self, key: &str) -> Result<IssueDetail> {
            Err(Error::FetchFailed {
                url: format!("fake://issue/{key}"),
                status: Some(500),
                message: "permanent outage".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn concurrent_fetches_never_exceed_the_gate() {
        let api = Arc::new(GaugedApi {
            current: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        });
        let enricher = IssueEnricher::new(api.clone(), 3, "DEMO", "https://jira.example");

        let mut set = tokio::task::JoinSet::new();
        for i in 0..20 {
            let enricher = enricher.clone();
            set.spawn(async move { enricher.enrich(&format!("DEMO-{i}")).await });
        }
        let mut completed = 0;
        while let Some(result) = set.join_next().await {
            assert!(result.unwrap().is_some());
            completed += 1;
        }

        assert_eq!(completed, 20);
        let high_water = api.high_water.load(Ordering::SeqCst);
        assert!(high_water <= 3, "observed {high_water} concurrent fetches");
        assert!(high_water >= 2, "gate never saturated, high water {high_water}");
    }

    #[tokio::test]
    async fn fetch_failure_yields_none() {
        let enricher = IssueEnricher::new(Arc::new(FailingApi), 2, "DEMO", "https://jira.example");
        assert!(enricher.enrich("DEMO-1").await.is_none());
    }
}
