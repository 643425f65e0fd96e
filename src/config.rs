use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ml::UnknownModelPolicy;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Location of the trained artifacts
    #[serde(default)]
    pub artifacts: ArtifactConfig,

    /// Form page and static assets
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Prediction behaviour
    #[serde(default)]
    pub prediction: PredictionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CARDIO__)
            .add_source(
                config::Environment::with_prefix("CARDIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory holding the four artifacts
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,

    /// Ordered feature column list
    #[serde(default = "default_features_file")]
    pub features_file: String,

    /// Fitted standard scaler
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,

    /// Logistic regression model
    #[serde(default = "default_logistic_file")]
    pub logistic_file: String,

    /// Decision tree model
    #[serde(default = "default_tree_file")]
    pub tree_file: String,
}

impl ArtifactConfig {
    pub fn features_path(&self) -> PathBuf {
        self.dir.join(&self.features_file)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    pub fn logistic_path(&self) -> PathBuf {
        self.dir.join(&self.logistic_file)
    }

    pub fn tree_path(&self) -> PathBuf {
        self.dir.join(&self.tree_file)
    }

    /// Same file names rooted at another directory
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            features_file: default_features_file(),
            scaler_file: default_scaler_file(),
            logistic_file: default_logistic_file(),
            tree_file: default_tree_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Directory served under /static
    #[serde(default = "default_frontend_dir")]
    pub dir: PathBuf,

    /// Page title shown on the form
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: default_frontend_dir(),
            title: default_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PredictionConfig {
    /// What to do with a model name that is neither logistic nor tree
    #[serde(default)]
    pub unknown_model_policy: UnknownModelPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: default_true(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_features_file() -> String {
    "heart_features.json".to_string()
}

fn default_scaler_file() -> String {
    "heart_scaler.json".to_string()
}

fn default_logistic_file() -> String {
    "logistic_regression_heart_model.json".to_string()
}

fn default_tree_file() -> String {
    "decision_tree_heart_model.json".to_string()
}

fn default_frontend_dir() -> PathBuf {
    PathBuf::from("frontend")
}

fn default_title() -> String {
    "Heart Disease Prediction".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "cardio-predict".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_http_port(), 8000);
        assert_eq!(default_log_level(), "info");
        assert!(default_true());
    }

    #[test]
    fn test_artifact_paths() {
        let artifacts = ArtifactConfig::default().with_dir("/srv/models");
        assert_eq!(
            artifacts.scaler_path(),
            PathBuf::from("/srv/models/heart_scaler.json")
        );
        assert_eq!(
            artifacts.tree_path(),
            PathBuf::from("/srv/models/decision_tree_heart_model.json")
        );
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.http_port, 8000);
        assert_eq!(
            config.prediction.unknown_model_policy,
            UnknownModelPolicy::Fallback
        );
        assert_eq!(config.artifacts.features_file, "heart_features.json");
    }
}
