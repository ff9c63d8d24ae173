//! HTTP client for the NameNode `/jmx` endpoint.

use bytes::Bytes;
use std::time::Duration;

use crate::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("namenode-exporter/", env!("CARGO_PKG_VERSION"));

/// Issues the single GET of each scrape cycle.
///
/// The request deadline is the only temporal bound on a cycle. The response
/// is consumed or dropped on every return path, so the pooled connection is
/// always released.
#[derive(Debug, Clone)]
pub struct JmxClient {
    http: reqwest::Client,
}

impl JmxClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// GET `endpoint` and return the raw body.
    ///
    /// Any network failure, non-2xx status, or body read failure is a
    /// [`FetchError::Transport`]. No retries.
    pub async fn fetch(&self, endpoint: &str) -> Result<Bytes, FetchError> {
        let resp = self.http.get(endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "GET {} returned HTTP {}",
                endpoint, status
            )));
        }

        Ok(resp.bytes().await?)
    }
}
