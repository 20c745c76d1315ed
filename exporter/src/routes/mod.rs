//! HTTP routes.

use std::sync::Arc;

use axum::{Router, routing::get};

use scraper::{ReleaseFetcher, StatusFetcher, VersionProbe};

use crate::config::HEALTH_PATH;
use crate::state::AppState;

pub mod health;
pub mod metrics;

/// Builds the exporter router: `GET {metrics_path}` and `GET /health`.
pub fn router<S, R, V>(metrics_path: &str, state: Arc<AppState<S, R, V>>) -> Router
where
    S: StatusFetcher + 'static,
    R: ReleaseFetcher + 'static,
    V: VersionProbe + 'static,
{
    Router::new()
        .route(metrics_path, get(metrics::metrics::<S, R, V>))
        .route(HEALTH_PATH, get(health::health))
        .with_state(state)
}
