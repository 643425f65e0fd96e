/// Prometheus metrics for the prediction service.
///
/// Covers HTTP traffic, prediction counts and latency per model, errors and
/// build information. All metrics live in one global registry exported at
/// `/metrics`.
///
/// # Example
/// ```no_run
/// use cardio_predict::metrics::PREDICTIONS_TOTAL;
///
/// PREDICTIONS_TOTAL
///     .with_label_values(&["logistic", "1"])
///     .inc();
/// ```

mod config;
mod middleware;

pub use config::MetricsConfig;
pub use middleware::track_metrics;

use lazy_static::lazy_static;
use once_cell::sync::OnceCell;
use prometheus::{CounterVec, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "cardio_predict";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    // ============================================================================
    // Prediction Metrics
    // ============================================================================

    /// Total number of predictions served
    ///
    /// Labels: model, outcome (0 or 1)
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of predictions served")
            .namespace(NAMESPACE),
        &["model", "outcome"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Encode, scale and predict duration in seconds
    ///
    /// Labels: model
    pub static ref PREDICTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "prediction_duration_seconds",
            "Time spent encoding, scaling and predicting"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.00001, 0.000025, 0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.005]),
        &["model"]
    ).expect("Failed to create PREDICTION_DURATION_SECONDS metric");

    /// Number of feature columns in the loaded schema
    pub static ref ARTIFACT_FEATURE_COLUMNS: Gauge = Gauge::with_opts(
        Opts::new("artifact_feature_columns", "Number of columns in the loaded feature schema")
            .namespace(NAMESPACE)
    ).expect("Failed to create ARTIFACT_FEATURE_COLUMNS metric");

    // ============================================================================
    // Error & System Metrics
    // ============================================================================

    /// Total number of errors
    ///
    /// Labels: component, error_type
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("errors_total", "Total number of errors")
            .namespace(NAMESPACE),
        &["component", "error_type"]
    ).expect("Failed to create ERRORS_TOTAL metric");

    /// Build information
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

static INIT: OnceCell<()> = OnceCell::new();

/// Register all metrics with the global registry.
///
/// Safe to call more than once; registration happens on the first call only.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    INIT.get_or_try_init(|| {
        PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(PREDICTION_DURATION_SECONDS.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(ARTIFACT_FEATURE_COLUMNS.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(ERRORS_TOTAL.clone()))?;
        PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;

        BUILD_INFO
            .with_label_values(&[env!("CARGO_PKG_VERSION")])
            .set(1.0);

        tracing::info!("Prometheus metrics initialized successfully");
        Ok(())
    })
    .map(|_| ())
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
