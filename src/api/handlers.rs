use crate::api::templates::{render_page, ResultView};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::ml::{ModelMetadata, RawRecord, UnknownModelPolicy};
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::StatusCode,
    response::Html,
    Form, Json,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        feature_columns: state.service.bundle().schema().len(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub feature_columns: usize,
}

/// Render the empty input form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.frontend.title, None))
}

/// Form submission: predict and render the result on the form page
pub async fn predict_form(
    State(state): State<AppState>,
    form: std::result::Result<Form<PredictRequest>, FormRejection>,
) -> Result<Html<String>> {
    let Form(request) = form.map_err(|e| AppError::Validation(e.body_text()))?;
    let view = run_prediction(&state, request)?;

    Ok(Html(render_page(&state.frontend.title, Some(&view))))
}

/// JSON variant of the form submission
pub async fn predict_json(
    State(state): State<AppState>,
    body: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let view = run_prediction(&state, request)?;

    Ok(Json(PredictResponse {
        prediction: view.prediction.to_string(),
        label: view.label,
        model_used: view.model_used.to_string(),
        probability: view.probability,
    }))
}

fn run_prediction(state: &AppState, request: PredictRequest) -> Result<ResultView> {
    request.validate()?;

    let kind = state.service.resolve_model(&request.model)?;
    let prediction = state.service.predict(&request.to_record(), kind)?;

    Ok(ResultView {
        prediction: prediction.message(),
        label: prediction.diagnosis.label(),
        model_used: prediction.model_used(),
        probability: prediction.probability,
    })
}

/// Clinical fields of one patient plus the requested model
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PredictRequest {
    pub model: String,
    #[validate(range(min = 0))]
    pub age: i64,
    #[validate(range(min = 0))]
    pub trestbps: i64,
    #[validate(range(min = 0))]
    pub chol: i64,
    #[validate(range(min = 0))]
    pub thalach: i64,
    #[validate(custom(function = "validate_finite"))]
    pub oldpeak: f64,
    #[validate(range(min = 0))]
    pub sex: i64,
    #[validate(range(min = 0))]
    pub cp: i64,
    #[validate(range(min = 0))]
    pub fbs: i64,
    #[validate(range(min = 0))]
    pub restecg: i64,
    #[validate(range(min = 0))]
    pub exang: i64,
    #[validate(range(min = 0))]
    pub slope: i64,
    #[validate(range(min = 0))]
    pub ca: i64,
    #[validate(range(min = 0))]
    pub thal: i64,
}

impl PredictRequest {
    pub fn to_record(&self) -> RawRecord {
        RawRecord::new()
            .with_int("age", self.age)
            .with_int("trestbps", self.trestbps)
            .with_int("chol", self.chol)
            .with_int("thalach", self.thalach)
            .with_float("oldpeak", self.oldpeak)
            .with_int("sex", self.sex)
            .with_int("cp", self.cp)
            .with_int("fbs", self.fbs)
            .with_int("restecg", self.restecg)
            .with_int("exang", self.exang)
            .with_int("slope", self.slope)
            .with_int("ca", self.ca)
            .with_int("thal", self.thal)
    }
}

fn validate_finite(value: f64) -> std::result::Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("not_finite"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub label: u8,
    pub model_used: String,
    pub probability: f64,
}

/// Describe the loaded models and feature layout
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let bundle = state.service.bundle();
    let categorical_levels = bundle
        .input()
        .categorical()
        .map(|field| (field.name.to_string(), bundle.schema().levels(field.name)))
        .collect();

    Json(ModelsResponse {
        models: state.service.models(),
        feature_columns: bundle.schema().columns().to_vec(),
        categorical_levels,
        unknown_model_policy: state.service.policy(),
        loaded_at: bundle.loaded_at(),
    })
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelMetadata>,
    pub feature_columns: Vec<String>,
    /// Levels with their own indicator column; the omitted level is the reference
    pub categorical_levels: BTreeMap<String, Vec<i64>>,
    pub unknown_model_policy: UnknownModelPolicy,
    pub loaded_at: DateTime<Utc>,
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}
