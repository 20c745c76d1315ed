use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error};

use scraper::{RenderError, ReleaseFetcher, ScrapeError, StatusFetcher, VersionProbe};

use crate::state::AppState;

/// Why a scrape produced no metrics.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Error fetching data: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("Error rendering metrics: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// `GET /metrics`
///
/// Runs one scrape and returns the Prometheus text exposition. The response
/// is held open until every configured source has answered. If any of them
/// failed, no gauges are written and the body carries the error instead.
pub async fn metrics<S, R, V>(
    State(state): State<Arc<AppState<S, R, V>>>,
) -> Result<Response, MetricsError>
where
    S: StatusFetcher,
    R: ReleaseFetcher,
    V: VersionProbe,
{
    let start = Instant::now();

    let snapshot = state.aggregator.aggregate().await?;
    let body = state.renderer.render(&snapshot).inspect_err(|e| {
        error!(error = %e, "could not render metrics");
    })?;

    debug!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scrape completed"
    );

    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response())
}
