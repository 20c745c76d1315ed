//! Shared application state.

use std::sync::Arc;

use scraper::{
    Aggregator, BinaryVersionProbe, GithubReleaseClient, MetricsRenderer, TendermintRpcClient,
};

/// State held by the HTTP handlers.
///
/// Read-only after startup: concurrent scrapes share it without locking.
pub struct AppState<S, R, V> {
    /// Fans each scrape out to the configured sources.
    pub aggregator: Aggregator<S, R, V>,
    /// Turns a snapshot into Prometheus text.
    pub renderer: MetricsRenderer,
}

impl<S, R, V> AppState<S, R, V> {
    pub fn new(aggregator: Aggregator<S, R, V>, renderer: MetricsRenderer) -> Self {
        Self {
            aggregator,
            renderer,
        }
    }
}

/// Thread-safe alias for the production `AppState`.
pub type SharedState =
    Arc<AppState<TendermintRpcClient, GithubReleaseClient, BinaryVersionProbe>>;
