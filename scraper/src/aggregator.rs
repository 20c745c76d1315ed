//! Per-scrape fan-out and fan-in.
//!
//! [`Aggregator::aggregate`] starts up to four fetches concurrently:
//!
//! 1. local node status (always),
//! 2. remote node status (if `remote_rpc` is set),
//! 3. latest GitHub release (if `github` is set),
//! 4. binary version (if `binary` is set),
//!
//! and waits for *all* of them before resolving. Failures are then resolved
//! in that fixed order, so the reported error does not depend on which
//! fetch happened to finish first. Any configured source failing fails the
//! whole scrape: the exported gauges cross-reference each other (e.g. the
//! version mismatch gauge needs both versions), and a partial snapshot
//! would render misleading values.
//!
//! Outstanding fetches are not cancelled when a sibling fails. Doing so
//! would lower latency under failure without changing the reported error.

use std::sync::Arc;

use tracing::{debug, error};

use crate::client::{ReleaseFetcher, StatusFetcher, VersionProbe};
use crate::config::ScrapeConfig;
use crate::error::{FetchError, ScrapeError, ScrapeSource};
use crate::types::ScrapeSnapshot;

/// Joins the configured sources into one [`ScrapeSnapshot`].
pub struct Aggregator<S, R, V> {
    config: Arc<ScrapeConfig>,
    status: S,
    release: R,
    version: V,
}

impl<S, R, V> Aggregator<S, R, V>
where
    S: StatusFetcher,
    R: ReleaseFetcher,
    V: VersionProbe,
{
    pub fn new(config: Arc<ScrapeConfig>, status: S, release: R, version: V) -> Self {
        Self {
            config,
            status,
            release,
            version,
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Runs one scrape.
    pub async fn aggregate(&self) -> Result<ScrapeSnapshot, ScrapeError> {
        let cfg = &*self.config;

        let local = self.status.fetch_status(&cfg.local_rpc);

        let remote = async {
            match cfg.remote_rpc.as_deref() {
                Some(url) => Some(self.status.fetch_status(url).await),
                None => {
                    debug!("no remote tendermint RPC address set, not requesting its status");
                    None
                }
            }
        };

        let release = async {
            match cfg.github.as_ref() {
                Some(github) => Some(self.release.fetch_latest_release(github).await),
                None => {
                    debug!("no GitHub org or repo set, not requesting latest release");
                    None
                }
            }
        };

        let version = async {
            match cfg.binary.as_ref() {
                Some(binary) => Some(self.version.probe_version(binary).await),
                None => {
                    debug!("binary path not set, not querying its version");
                    None
                }
            }
        };

        let (local, remote, release, version) = tokio::join!(local, remote, release, version);

        let local = local.map_err(|e| failed(ScrapeSource::LocalStatus, e))?;
        let remote = remote
            .transpose()
            .map_err(|e| failed(ScrapeSource::RemoteStatus, e))?;
        let release = release
            .transpose()
            .map_err(|e| failed(ScrapeSource::Release, e))?;
        let version = version
            .transpose()
            .map_err(|e| failed(ScrapeSource::Version, e))?;

        Ok(ScrapeSnapshot {
            local,
            remote,
            release,
            version,
        })
    }
}

fn failed(source: ScrapeSource, error: FetchError) -> ScrapeError {
    error!(source = %source, error = %error, "could not fetch scrape data");
    ScrapeError::new(source, error)
}
