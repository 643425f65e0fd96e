pub mod handlers;
pub mod routes;
pub mod templates;

pub use routes::*;

use crate::config::FrontendConfig;
use crate::metrics::MetricsConfig;
use crate::ml::PredictionService;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub frontend: Arc<FrontendConfig>,
    pub metrics: Arc<MetricsConfig>,
    pub request_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<PredictionService>) -> Self {
        Self {
            service,
            frontend: Arc::new(FrontendConfig::default()),
            metrics: Arc::new(MetricsConfig::default()),
            request_timeout: Duration::from_secs(30),
            started_at: Instant::now(),
        }
    }

    /// Set the form page and static asset configuration
    pub fn with_frontend(mut self, frontend: FrontendConfig) -> Self {
        self.frontend = Arc::new(frontend);
        self
    }

    /// Set the HTTP metrics configuration
    pub fn with_metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
