use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main router
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.frontend.dir);
    let metrics_config = state.metrics.clone();
    let timeout = state.request_timeout;

    Router::new()
        // Form page
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        // JSON API
        .route("/v1/predict", post(handlers::predict_json))
        .route("/v1/models", get(handlers::list_models))
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .nest_service("/static", static_files)
        // Add state
        .with_state(state)
        // Add middleware
        .layer(middleware::from_fn_with_state(metrics_config, track_metrics))
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new()),
        )
}
