//! Scrape configuration.
//!
//! A single [`ScrapeConfig`] is built once at process start and shared
//! read-only (behind an `Arc`) by the aggregator and the renderer. Optional
//! sources are `Option`s: a `None` means "not configured, skip", which the
//! aggregator never confuses with "configured but failing".

use std::path::PathBuf;
use std::time::Duration;

/// Default base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default local Tendermint RPC address.
pub const DEFAULT_LOCAL_RPC: &str = "http://localhost:26657";

/// Default arguments passed to the node binary to get its version as JSON.
pub const DEFAULT_BINARY_ARGS: &str = "version --long --output json";

/// Fixed timeout for the GitHub release request.
pub const RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to look up the latest published release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GithubConfig {
    /// Base URL of the API, e.g. `"https://api.github.com"`.
    pub api_url: String,
    pub organization: String,
    pub repository: String,
    /// Personal access token sent as a bearer token, if set.
    pub token: Option<String>,
}

impl GithubConfig {
    pub fn new(organization: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            organization: organization.into(),
            repository: repository.into(),
            token: None,
        }
    }

    /// URL of the "latest release" endpoint for this repository.
    pub fn latest_release_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url.trim_end_matches('/'),
            self.organization,
            self.repository
        )
    }
}

/// How to invoke the node binary for its version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
}

impl BinaryConfig {
    /// Builds a binary config from a whitespace-separated argument string,
    /// as accepted on the command line.
    pub fn from_arg_string(path: impl Into<PathBuf>, args: &str) -> Self {
        Self {
            path: path.into(),
            args: args.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Everything a scrape needs to know about its sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeConfig {
    /// Local node RPC base URL; always queried.
    pub local_rpc: String,
    /// Reference node RPC base URL.
    pub remote_rpc: Option<String>,
    pub github: Option<GithubConfig>,
    pub binary: Option<BinaryConfig>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            local_rpc: DEFAULT_LOCAL_RPC.to_string(),
            remote_rpc: None,
            github: None,
            binary: None,
        }
    }
}
