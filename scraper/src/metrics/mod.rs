//! Prometheus rendering of scrape snapshots.
//!
//! Typical usage from an HTTP handler:
//!
//! ```ignore
//! use std::sync::Arc;
//! use scraper::metrics::MetricsRenderer;
//!
//! let renderer = MetricsRenderer::new(config.clone());
//! let snapshot = aggregator.aggregate().await?;
//! let body = renderer.render(&snapshot)?;
//! ```

pub mod prometheus;

pub use self::prometheus::{MetricsRenderer, NodeMetrics, versions_match};
