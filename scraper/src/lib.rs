//! Scrape library for the Tendermint exporter.
//!
//! On every scrape the exporter asks several independent sources for data,
//! joins the answers and renders them as Prometheus gauges:
//!
//! - value types for one scrape (`types`),
//! - clients for the node RPC, GitHub releases and the node binary (`client`),
//! - the concurrent fan-out/fan-in (`aggregator`),
//! - Prometheus rendering (`metrics`),
//! - the immutable scrape configuration (`config`),
//! - and error types (`error`).
//!
//! Binaries wire these pieces behind an HTTP endpoint.

pub mod aggregator;
pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use aggregator::Aggregator;
pub use config::{BinaryConfig, GithubConfig, ScrapeConfig};
pub use error::{FetchError, RenderError, ScrapeError, ScrapeSource};
pub use metrics::{MetricsRenderer, versions_match};

pub use client::{
    BinaryVersionProbe, GithubReleaseClient, ReleaseFetcher, StatusFetcher, TendermintRpcClient,
    VersionProbe, extract_json_line,
};

pub use types::*;

/// The aggregator stack used by the exporter binary: real HTTP and
/// subprocess clients.
pub type DefaultAggregator = Aggregator<TendermintRpcClient, GithubReleaseClient, BinaryVersionProbe>;
