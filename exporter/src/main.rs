// exporter/src/main.rs

//! Tendermint exporter binary.
//!
//! Serves Prometheus metrics about a Tendermint / CometBFT node:
//!
//! - `GET /metrics` (path configurable): scrapes the local node, and
//!   optionally a reference node, the node binary's version and the latest
//!   GitHub release, then renders the result;
//! - `GET /health`: liveness only.
//!
//! Nothing is scraped in the background: each request to the metrics path
//! does one fresh round of fetches.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use scraper::{
    Aggregator, BinaryVersionProbe, DefaultAggregator, GithubReleaseClient, MetricsRenderer,
    TendermintRpcClient,
};

use config::{Cli, ExporterConfig};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ExporterConfig::load(Cli::parse()).context("invalid configuration")?;

    init_tracing(cfg.log_level, cfg.json_logs);

    run(cfg).await.inspect_err(|e| {
        error!(error = %format!("{e:#}"), "could not start application");
    })
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG`, when set, takes precedence over `--log-level`.
fn init_tracing(level: Level, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cfg: ExporterConfig) -> anyhow::Result<()> {
    let scrape = Arc::new(cfg.scrape);

    info!(
        local_rpc = %scrape.local_rpc,
        remote_rpc = scrape.remote_rpc.as_deref().unwrap_or("-"),
        github = scrape.github.is_some(),
        binary = scrape.binary.is_some(),
        "configured scrape sources"
    );

    // ---------------------------
    // Clients + aggregator
    // ---------------------------

    let aggregator: DefaultAggregator = Aggregator::new(
        scrape.clone(),
        TendermintRpcClient::new().context("failed to create RPC client")?,
        GithubReleaseClient::new().context("failed to create GitHub client")?,
        BinaryVersionProbe::new(),
    );

    let app_state: SharedState =
        Arc::new(AppState::new(aggregator, MetricsRenderer::new(scrape)));

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = routes::router(&cfg.metrics_path, app_state);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen_addr))?;

    info!(address = %cfg.listen_addr, path = %cfg.metrics_path, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown signal received");
}
