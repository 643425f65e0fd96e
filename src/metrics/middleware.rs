/// HTTP middleware recording request counts and durations

use super::*;
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

/// Axum middleware function for metrics collection
///
/// # Example
/// ```no_run
/// use axum::{middleware, Router};
/// use cardio_predict::metrics::{track_metrics, MetricsConfig};
/// use std::sync::Arc;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn_with_state(
///         Arc::new(MetricsConfig::default()),
///         track_metrics,
///     ));
/// ```
pub async fn track_metrics(
    State(config): State<Arc<MetricsConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if !config.enabled {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    if config.is_path_excluded(&path) {
        return next.run(req).await;
    }

    let start = Instant::now();
    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    if config.enable_histograms {
        HTTP_REQUEST_DURATION_SECONDS
            .with_label_values(&[&method, &path])
            .observe(start.elapsed().as_secs_f64());
    }

    response
}
