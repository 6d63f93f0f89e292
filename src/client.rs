//! Retrying HTTP client
//!
//! Thin wrapper over [`reqwest`] that applies the crate's fixed-delay retry
//! policy to every GET. A request counts as successful only when the status
//! is 2xx *and* the body deserializes as JSON; transport errors, non-2xx
//! statuses, and parse failures are all treated identically as retryable.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::fetch_with_retry;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// HTTP client with a fixed-attempt, fixed-delay retry policy
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the underlying reqwest client cannot be built.
    pub fn new(request_timeout: Duration, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("jira-harvest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, retry })
    }

    /// GET `url` with `params` and deserialize the JSON body
    ///
    /// Retries up to the configured attempt budget with the configured flat
    /// delay between attempts.
    ///
    /// # Errors
    /// Returns [`Error::FetchFailed`] carrying the URL and the last observed
    /// status once the budget is exhausted.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        params: &[(&str, String)],
    ) -> Result<T> {
        fetch_with_retry(&self.retry, || self.attempt(url, params))
            .await
            .map_err(|e| match e {
                fetch @ Error::FetchFailed { .. } => fetch,
                other => Error::FetchFailed {
                    url: url.to_string(),
                    status: None,
                    message: other.to_string(),
                },
            })
    }

    async fn attempt<T: DeserializeOwned>(&self, url: &Url, params: &[(&str, String)]) -> Result<T> {
        let response = self.client.get(url.clone()).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("unexpected status {status}"),
            });
        }
        let body = response.json::<T>().await?;
        Ok(body)
    }
}
