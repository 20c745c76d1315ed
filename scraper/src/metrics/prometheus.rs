//! Prometheus gauges for a scrape snapshot.
//!
//! A fresh [`Registry`] is built for every render so that label sets from a
//! previous scrape (an old moniker, an old release tag) never linger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::config::ScrapeConfig;
use crate::error::RenderError;
use crate::types::ScrapeSnapshot;

/// Gauges exported for one scrape.
#[derive(Clone)]
pub struct NodeMetrics {
    pub catching_up: GaugeVec,
    pub app_version: GaugeVec,
    pub voting_power: GaugeVec,
    pub time_since_latest_block: GaugeVec,
    pub github_latest_version: GaugeVec,
    pub latest_version_mismatch: GaugeVec,
    pub local_node_latest_block: GaugeVec,
    pub remote_node_latest_block: GaugeVec,
}

impl NodeMetrics {
    /// Registers all gauges into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let node_labels = &["id", "moniker"];

        let catching_up = gauge_vec(
            registry,
            "tendermint_node_catching_up",
            "Is node catching up?",
            node_labels,
        )?;
        let app_version = gauge_vec(
            registry,
            "tendermint_node_app_version",
            "App version",
            &["id", "moniker", "version"],
        )?;
        let voting_power = gauge_vec(
            registry,
            "tendermint_node_voting_power",
            "Voting power",
            node_labels,
        )?;
        let time_since_latest_block = gauge_vec(
            registry,
            "tendermint_node_time_since_latest_block",
            "Time since latest block, in seconds",
            node_labels,
        )?;
        let github_latest_version = gauge_vec(
            registry,
            "tendermint_github_latest_version",
            "Github latest version",
            &["organization", "repository", "version"],
        )?;
        let latest_version_mismatch = gauge_vec(
            registry,
            "tendermint_latest_version_mismatch",
            "If using the latest version or not",
            &["id", "moniker", "local_version", "remote_version"],
        )?;
        let local_node_latest_block = gauge_vec(
            registry,
            "tendermint_local_node_latest_block",
            "Local node latest block",
            node_labels,
        )?;
        let remote_node_latest_block = gauge_vec(
            registry,
            "tendermint_remote_node_latest_block",
            "Remote node latest block",
            node_labels,
        )?;

        Ok(Self {
            catching_up,
            app_version,
            voting_power,
            time_since_latest_block,
            github_latest_version,
            latest_version_mismatch,
            local_node_latest_block,
            remote_node_latest_block,
        })
    }

    /// Sets every gauge that `snapshot` has data for.
    fn record(
        &self,
        config: &ScrapeConfig,
        snapshot: &ScrapeSnapshot,
        now: DateTime<Utc>,
    ) -> Result<(), prometheus::Error> {
        let local = &snapshot.local;
        let node = &[local.node_id.as_str(), local.moniker.as_str()];

        self.catching_up
            .get_metric_with_label_values(node)?
            .set(bool_to_f64(local.catching_up));
        self.voting_power
            .get_metric_with_label_values(node)?
            .set(local.voting_power as f64);
        self.time_since_latest_block
            .get_metric_with_label_values(node)?
            .set(local.seconds_since_latest_block(now));

        if let Some(version) = &snapshot.version {
            self.app_version
                .get_metric_with_label_values(&[&local.node_id, &local.moniker, &version.version])?
                .set(1.0);
        }

        // The organization/repository labels come from configuration; a
        // release can only be present when GitHub is configured.
        if let (Some(release), Some(github)) = (&snapshot.release, &config.github) {
            self.github_latest_version
                .get_metric_with_label_values(&[
                    &github.organization,
                    &github.repository,
                    &release.tag_name,
                ])?
                .set(1.0);
        }

        if let (Some(version), Some(release)) = (&snapshot.version, &snapshot.release) {
            let mismatch = !versions_match(&version.version, &release.tag_name);
            self.latest_version_mismatch
                .get_metric_with_label_values(&[
                    &local.node_id,
                    &local.moniker,
                    &version.version,
                    &release.tag_name,
                ])?
                .set(bool_to_f64(mismatch));
        }

        self.local_node_latest_block
            .get_metric_with_label_values(node)?
            .set(local.latest_block_height as f64);

        if let Some(remote) = &snapshot.remote {
            self.remote_node_latest_block
                .get_metric_with_label_values(&[&remote.node_id, &remote.moniker])?
                .set(remote.latest_block_height as f64);
        }

        Ok(())
    }
}

fn gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, prometheus::Error> {
    let gauge = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Loose version comparison: two versions match if either string contains
/// the other.
///
/// This tolerates a local build reporting a prefixed or suffixed form of
/// the release tag (`v1.2.0` vs `1.2.0`, `1.2.0-3-gabcdef`), at the cost of
/// also treating e.g. `1.2` and `1.2.10` as matching. It is a heuristic, not
/// semantic-version equality.
pub fn versions_match(local: &str, remote: &str) -> bool {
    local.contains(remote) || remote.contains(local)
}

fn bool_to_f64(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Renders scrape snapshots as Prometheus text exposition.
#[derive(Clone, Debug)]
pub struct MetricsRenderer {
    config: Arc<ScrapeConfig>,
}

impl MetricsRenderer {
    pub fn new(config: Arc<ScrapeConfig>) -> Self {
        Self { config }
    }

    /// Renders `snapshot`, measuring block age against the current time.
    pub fn render(&self, snapshot: &ScrapeSnapshot) -> Result<String, RenderError> {
        self.render_at(snapshot, Utc::now())
    }

    /// Renders `snapshot` as of `now`. Output is byte-identical for equal
    /// inputs.
    pub fn render_at(
        &self,
        snapshot: &ScrapeSnapshot,
        now: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        let registry = Registry::new();
        let metrics = NodeMetrics::register(&registry)?;
        metrics.record(&self.config, snapshot, now)?;

        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
