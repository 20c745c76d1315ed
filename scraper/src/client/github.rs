//! GitHub "latest release" client.
//!
//! ```text
//! GET {api_url}/repos/{org}/{repo}/releases/latest
//! Authorization: Bearer <token>        (only if a token is configured)
//! ```
//!
//! Only `name` and `tag_name` are read from the response.

use std::time::Duration;

use reqwest::{Client, header};

use crate::client::ReleaseFetcher;
use crate::config::{GithubConfig, RELEASE_TIMEOUT};
use crate::error::FetchError;
use crate::types::ReleaseInfo;

/// Client for the GitHub releases API.
///
/// Every request is bounded by [`RELEASE_TIMEOUT`] unless built with
/// [`GithubReleaseClient::with_timeout`].
#[derive(Clone, Debug)]
pub struct GithubReleaseClient {
    client: Client,
    timeout: Duration,
}

impl GithubReleaseClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(RELEASE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        // GitHub rejects requests without a User-Agent.
        let client = Client::builder()
            .user_agent(concat!("tendermint-exporter/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(&e))?;

        Ok(Self { client, timeout })
    }

    /// Upper bound on a whole release request, connect through body.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ReleaseFetcher for GithubReleaseClient {
    async fn fetch_latest_release(&self, github: &GithubConfig) -> Result<ReleaseInfo, FetchError> {
        let url = github.latest_release_url();

        let mut req = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github+json");

        if let Some(token) = github.token.as_deref() {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| FetchError::transport(&e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = resp.bytes().await.map_err(|e| FetchError::transport(&e))?;
        Ok(serde_json::from_slice::<ReleaseInfo>(&body)?)
    }
}
