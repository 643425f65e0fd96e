/// Configuration for HTTP metrics collection

/// Configuration for metrics collection and export
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Enable metrics collection
    pub enabled: bool,

    /// Enable histogram metrics
    pub enable_histograms: bool,

    /// Paths to exclude from HTTP metrics
    pub excluded_paths: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enable_histograms: true,
            excluded_paths: vec![
                "/health".to_string(),
                "/metrics".to_string(),
                "/static".to_string(),
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a configuration with metrics disabled
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Check if a path should be excluded from metrics
    pub fn is_path_excluded(&self, path: &str) -> bool {
        self.excluded_paths.iter().any(|excluded| {
            // Support exact match and prefix match
            path == excluded || path.starts_with(&format!("{}/", excluded))
        })
    }
}
