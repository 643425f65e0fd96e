//! Shared fixtures for the integration tests.
//!
//! Everything here reads the frozen artifacts checked in under `artifacts/`.

#![allow(dead_code)]

use cardio_predict::{
    api::{build_router, AppState},
    config::ArtifactConfig,
    metrics::MetricsConfig,
    ml::{ArtifactBundle, PredictionService, RawRecord, UnknownModelPolicy},
};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

pub fn artifacts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts")
}

pub fn artifact_config() -> ArtifactConfig {
    ArtifactConfig::default().with_dir(artifacts_dir())
}

pub fn load_bundle() -> Arc<ArtifactBundle> {
    Arc::new(ArtifactBundle::load(&artifact_config()).expect("frozen artifacts load"))
}

pub fn service(policy: UnknownModelPolicy) -> Arc<PredictionService> {
    Arc::new(PredictionService::new(load_bundle(), policy))
}

pub fn app(policy: UnknownModelPolicy) -> Router {
    let state = AppState::new(service(policy)).with_metrics(MetricsConfig::disabled());
    build_router(state)
}

/// 63 year old male, asymptomatic chest pain, high fasting sugar, normal thal
pub fn sample_record() -> RawRecord {
    RawRecord::new()
        .with_int("age", 63)
        .with_int("trestbps", 145)
        .with_int("chol", 233)
        .with_int("thalach", 150)
        .with_float("oldpeak", 2.3)
        .with_int("sex", 1)
        .with_int("cp", 3)
        .with_int("fbs", 1)
        .with_int("restecg", 0)
        .with_int("exang", 0)
        .with_int("slope", 0)
        .with_int("ca", 0)
        .with_int("thal", 1)
}

/// Low heart rate, exercise angina, two vessels, reversible defect
pub fn low_risk_record() -> RawRecord {
    sample_record()
        .with_int("thalach", 120)
        .with_float("oldpeak", 3.0)
        .with_int("cp", 0)
        .with_int("ca", 2)
        .with_int("exang", 1)
        .with_int("thal", 3)
}

/// Every categorical field at its reference level
pub fn reference_record() -> RawRecord {
    RawRecord::new()
        .with_int("age", 50)
        .with_int("trestbps", 120)
        .with_int("chol", 200)
        .with_int("thalach", 160)
        .with_float("oldpeak", 0.0)
        .with_int("sex", 0)
        .with_int("cp", 0)
        .with_int("fbs", 0)
        .with_int("restecg", 0)
        .with_int("exang", 0)
        .with_int("slope", 0)
        .with_int("ca", 0)
        .with_int("thal", 0)
}

pub const SAMPLE_FORM: &str = "age=63&trestbps=145&chol=233&thalach=150&oldpeak=2.3\
    &sex=1&cp=3&fbs=1&restecg=0&exang=0&slope=0&ca=0&thal=1";

pub fn form_body(model: &str) -> String {
    format!("model={}&{}", model, SAMPLE_FORM)
}
