use cardio_predict::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    metrics::{MetricsConfig, ARTIFACT_FEATURE_COLUMNS},
    ml::{ArtifactBundle, PredictionService},
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    tracing::info!("Starting {} v{}", config.observability.service_name, env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    let metrics_config = if config.observability.prometheus_enabled {
        if let Err(e) = cardio_predict::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
            MetricsConfig::disabled()
        } else {
            tracing::info!("Prometheus metrics initialized");
            MetricsConfig::default()
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
        MetricsConfig::disabled()
    };

    // Artifacts must load before the server accepts requests
    let bundle = match ArtifactBundle::load(&config.artifacts) {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::error!(dir = %config.artifacts.dir.display(), "Failed to load artifacts: {}", e);
            return Err(e.into());
        }
    };
    ARTIFACT_FEATURE_COLUMNS.set(bundle.schema().len() as f64);

    let service = Arc::new(PredictionService::new(
        Arc::new(bundle),
        config.prediction.unknown_model_policy,
    ));
    tracing::info!(
        policy = ?config.prediction.unknown_model_policy,
        "Prediction service initialized"
    );

    let app_state = AppState::new(service)
        .with_frontend(config.frontend.clone())
        .with_metrics(metrics_config)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));

    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP server listening on http://{}", http_addr);
    tracing::info!("   Form: http://{}/", http_addr);
    tracing::info!("   JSON API: http://{}/v1/predict", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down gracefully");
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("cardio_predict={},tower_http=info", observability.log_level).into()
    });

    if observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
