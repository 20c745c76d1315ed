//! Clients for the sources a scrape fans out to.
//!
//! Each source sits behind a small trait so the aggregator can be driven by
//! stubs in tests:
//!
//! - [`StatusFetcher`]: Tendermint RPC `status` ([`rpc::TendermintRpcClient`]),
//! - [`ReleaseFetcher`]: GitHub latest release ([`github::GithubReleaseClient`]),
//! - [`VersionProbe`]: the node binary's own version ([`binary::BinaryVersionProbe`]).

use std::future::Future;

use crate::config::{BinaryConfig, GithubConfig};
use crate::error::FetchError;
use crate::types::{NodeStatus, ReleaseInfo, VersionInfo};

pub mod binary;
pub mod github;
pub mod rpc;

pub use binary::{BinaryVersionProbe, extract_json_line};
pub use github::GithubReleaseClient;
pub use rpc::TendermintRpcClient;

/// Fetches a node's status from its RPC endpoint.
pub trait StatusFetcher: Send + Sync {
    fn fetch_status(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<NodeStatus, FetchError>> + Send;
}

/// Fetches the latest published release of a repository.
pub trait ReleaseFetcher: Send + Sync {
    fn fetch_latest_release(
        &self,
        github: &GithubConfig,
    ) -> impl Future<Output = Result<ReleaseInfo, FetchError>> + Send;
}

/// Asks a local binary for its version.
pub trait VersionProbe: Send + Sync {
    fn probe_version(
        &self,
        binary: &BinaryConfig,
    ) -> impl Future<Output = Result<VersionInfo, FetchError>> + Send;
}
