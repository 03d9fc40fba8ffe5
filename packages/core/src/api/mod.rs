//! HTTP surface: liveness probes and metrics.

pub mod health;
pub mod metrics;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::metrics::AppMetrics;

/// Assemble the full router served by `main`.
pub fn create_router(app_metrics: Arc<AppMetrics>) -> Router {
    Router::new()
        .route("/", get(health::health))
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::metrics))
        .with_state(app_metrics)
        .layer(TraceLayer::new_for_http())
}
