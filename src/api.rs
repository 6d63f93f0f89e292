//! Remote tracker API surface
//!
//! [`IssueApi`] is the seam between the coordinator and the network: the
//! production implementation ([`JiraClient`]) goes through the retrying HTTP
//! client, while tests substitute in-process fakes to script pagination,
//! failures, and latency.

use crate::client::HttpClient;
use crate::error::Result;
use crate::types::{IssueDetail, SearchPage};
use async_trait::async_trait;
use url::Url;

/// Read access to the remote issue tracker
#[async_trait]
pub trait IssueApi: Send + Sync {
    /// Fetch one page of issue summaries for `project`, starting at
    /// `start_at`, with at most `max_results` entries
    async fn search_page(
        &self,
        project: &str,
        start_at: u64,
        max_results: usize,
    ) -> Result<SearchPage>;

    /// Fetch the full detail payload for one issue
    async fn issue_detail(&self, key: &str) -> Result<IssueDetail>;
}

/// [`IssueApi`] implementation against a Jira REST v2 instance
#[derive(Clone, Debug)]
pub struct JiraClient {
    http: HttpClient,
    search_url: Url,
    issue_url: Url,
}

impl JiraClient {
    /// Create a client for the Jira instance at `base_url`
    ///
    /// # Errors
    /// Returns an error when `base_url` does not parse as a URL.
    pub fn new(base_url: &str, http: HttpClient) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        Ok(Self {
            http,
            search_url: Url::parse(&format!("{base}/rest/api/2/search"))?,
            issue_url: Url::parse(&format!("{base}/rest/api/2/issue/"))?,
        })
    }
}

#[async_trait]
impl IssueApi for JiraClient {
    async fn search_page(
        &self,
        project: &str,
        start_at: u64,
        max_results: usize,
    ) -> Result<SearchPage> {
        let params = [
            ("jql", format!("project={project}")),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        self.http.get_json(&self.search_url, &params).await
    }

    async fn issue_detail(&self, key: &str) -> Result<IssueDetail> {
        let url = self.issue_url.join(key)?;
        self.http.get_json(&url, &[]).await
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base: &str) -> JiraClient {
        let http = HttpClient::new(
            Duration::from_secs(5),
            RetryConfig {
                max_attempts: 1,
                delay: Duration::from_millis(1),
            },
        )
        .unwrap();
        JiraClient::new(base, http).unwrap()
    }

    #[tokio::test]
    async fn search_page_sends_scoped_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/search"))
            .and(query_param("jql", "project=DEMO"))
            .and(query_param("startAt", "60"))
            .and(query_param("maxResults", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "issues": [{"key": "DEMO-61"}],
                "total": 61
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server.uri())
            .search_page("DEMO", 60, 30)
            .await
            .unwrap();
        assert_eq!(page.total, Some(61));
        assert_eq!(page.issues[0].key, "DEMO-61");
    }

    #[tokio::test]
    async fn issue_detail_hits_the_keyed_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/DEMO-61"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "key": "DEMO-61",
                "fields": {"summary": "a title"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let detail = test_client(&server.uri())
            .issue_detail("DEMO-61")
            .await
            .unwrap();
        assert_eq!(detail.key.as_deref(), Some("DEMO-61"));
        assert_eq!(
            detail.fields.unwrap().summary.as_deref(),
            Some("a title")
        );
    }
}
