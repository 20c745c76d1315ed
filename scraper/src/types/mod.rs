//! Value types produced by a single scrape.
//!
//! Every type in here is an immutable snapshot built fresh for one request
//! and dropped once the response has been rendered. Nothing is cached
//! between scrapes.

use serde::Deserialize;

/// Node status as reported by a Tendermint RPC `status` call.
pub mod status;

pub use status::NodeStatus;

/// Latest published release of the node software, as returned by the
/// GitHub releases API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ReleaseInfo {
    /// Human-readable release title. GitHub reports `null` for releases
    /// published without one.
    #[serde(default)]
    pub name: Option<String>,
    /// Git tag the release points at, e.g. `v0.47.3`.
    pub tag_name: String,
}

/// Version metadata self-reported by the node binary
/// (`<binary> version --long --output json`).
///
/// Cosmos SDK binaries print many more fields (commit, build deps, ...);
/// only the two used for labelling are kept.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VersionInfo {
    pub name: String,
    pub version: String,
}

/// The joined result of one successful scrape.
///
/// The local status is always present: a scrape where it could not be
/// fetched never produces a snapshot. Optional sources that were not
/// configured are `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrapeSnapshot {
    pub local: NodeStatus,
    pub remote: Option<NodeStatus>,
    pub release: Option<ReleaseInfo>,
    pub version: Option<VersionInfo>,
}
