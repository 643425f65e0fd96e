use crate::error::Result;
use crate::metrics::{PREDICTIONS_TOTAL, PREDICTION_DURATION_SECONDS};
use crate::ml::features::{FeatureEncoder, FeatureVector};
use crate::ml::models::{ModelKind, ModelMetadata, Prediction, UnknownModelPolicy};
use crate::ml::registry::ArtifactBundle;
use crate::ml::schema::RawRecord;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Encode → scale (logistic only) → predict over a shared artifact bundle.
///
/// Holds no mutable state; one instance serves every request concurrently.
pub struct PredictionService {
    bundle: Arc<ArtifactBundle>,
    encoder: FeatureEncoder,
    policy: UnknownModelPolicy,
}

impl PredictionService {
    pub fn new(bundle: Arc<ArtifactBundle>, policy: UnknownModelPolicy) -> Self {
        let encoder = FeatureEncoder::new(bundle.input(), Arc::clone(bundle.schema()));
        Self {
            bundle,
            encoder,
            policy,
        }
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    pub fn policy(&self) -> UnknownModelPolicy {
        self.policy
    }

    /// Map a requested model name using the configured policy
    pub fn resolve_model(&self, name: &str) -> Result<ModelKind> {
        ModelKind::resolve(name, self.policy)
    }

    /// Schema-aligned, unscaled encoding of `record`
    pub fn encode(&self, record: &RawRecord) -> Result<FeatureVector> {
        self.encoder.encode(record)
    }

    /// The vector `kind` consumes: scaled for logistic regression, raw for the tree
    pub fn model_input(&self, record: &RawRecord, kind: ModelKind) -> Result<FeatureVector> {
        let encoded = self.encode(record)?;
        if kind.uses_scaled_input() {
            self.bundle.scaler().transform(&encoded)
        } else {
            Ok(encoded)
        }
    }

    pub fn predict(&self, record: &RawRecord, kind: ModelKind) -> Result<Prediction> {
        let start = Instant::now();

        let input = self.model_input(record, kind)?;
        let prediction = self.bundle.registry().predict(kind, &input)?;

        PREDICTION_DURATION_SECONDS
            .with_label_values(&[kind.as_ref()])
            .observe(start.elapsed().as_secs_f64());
        PREDICTIONS_TOTAL
            .with_label_values(&[kind.as_ref(), &prediction.diagnosis.label().to_string()])
            .inc();

        debug!(
            model = %kind,
            label = prediction.diagnosis.label(),
            probability = prediction.probability,
            "Prediction complete"
        );

        Ok(prediction)
    }

    /// Resolve `model_name` and predict in one step
    pub fn predict_named(&self, record: &RawRecord, model_name: &str) -> Result<Prediction> {
        let kind = self.resolve_model(model_name)?;
        self.predict(record, kind)
    }

    pub fn models(&self) -> Vec<ModelMetadata> {
        self.bundle.registry().metadata()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::{DecisionTreeModel, LogisticRegressionModel, TreeNode};
    use crate::ml::models::Diagnosis;
    use crate::ml::registry::ModelRegistry;
    use crate::ml::scaler::StandardScaler;
    use crate::ml::schema::{FeatureSchema, InputSchema};

    /// Two-column service where scaling flips which side of each threshold `age` lands on
    fn service(policy: UnknownModelPolicy) -> PredictionService {
        let input = InputSchema::heart();
        let schema =
            FeatureSchema::new(vec!["age".to_string(), "sex_1".to_string()], &input).unwrap();
        let scaler = StandardScaler::new(vec![50.0, 0.5], vec![10.0, 0.5]).unwrap();

        // positive iff age > 0: true for raw ages, false for below-mean scaled ages
        let logistic = LogisticRegressionModel::new(vec![1.0, 0.0], 0.0).unwrap();
        // positive iff age > 10: true for raw ages, false for any plausible scaled age
        let tree = DecisionTreeModel::new(
            2,
            vec![
                TreeNode::internal(0, 10.0, 1, 2),
                TreeNode::leaf(9.0, 1.0),
                TreeNode::leaf(1.0, 9.0),
            ],
        )
        .unwrap();

        let bundle = ArtifactBundle::new(
            input,
            schema,
            scaler,
            ModelRegistry::new(logistic, tree),
        )
        .unwrap();
        PredictionService::new(Arc::new(bundle), policy)
    }

    fn record(age: i64) -> RawRecord {
        RawRecord::new()
            .with_int("age", age)
            .with_int("trestbps", 120)
            .with_int("chol", 200)
            .with_int("thalach", 150)
            .with_float("oldpeak", 1.0)
            .with_int("sex", 1)
            .with_int("cp", 0)
            .with_int("fbs", 0)
            .with_int("restecg", 0)
            .with_int("exang", 0)
            .with_int("slope", 0)
            .with_int("ca", 0)
            .with_int("thal", 0)
    }

    #[test]
    fn test_logistic_uses_scaled_vector() {
        let service = service(UnknownModelPolicy::Fallback);
        let input = service.model_input(&record(40), ModelKind::Logistic).unwrap();
        assert_eq!(input.values().to_vec(), vec![-1.0, 1.0]);

        // raw age 40 would be positive; scaled age -1.0 is negative
        let prediction = service.predict(&record(40), ModelKind::Logistic).unwrap();
        assert_eq!(prediction.diagnosis, Diagnosis::NoDisease);
    }

    #[test]
    fn test_tree_uses_unscaled_vector() {
        let service = service(UnknownModelPolicy::Fallback);
        let input = service.model_input(&record(40), ModelKind::DecisionTree).unwrap();
        assert_eq!(input.values().to_vec(), vec![40.0, 1.0]);

        // scaled age -1.0 would go left; raw age 40 goes right
        let prediction = service.predict(&record(40), ModelKind::DecisionTree).unwrap();
        assert_eq!(prediction.diagnosis, Diagnosis::DiseasePresent);
        assert_eq!(prediction.model_used(), "Decision Tree");
    }

    #[test]
    fn test_unknown_name_routes_to_tree() {
        let service = service(UnknownModelPolicy::Fallback);
        let prediction = service.predict_named(&record(40), "random_forest").unwrap();
        assert_eq!(prediction.model, ModelKind::DecisionTree);
        assert_eq!(prediction.model_used(), "Decision Tree");
    }

    #[test]
    fn test_unknown_name_rejected_under_strict_policy() {
        let service = service(UnknownModelPolicy::Reject);
        let err = service.predict_named(&record(40), "random_forest").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_missing_field_yields_no_prediction() {
        let service = service(UnknownModelPolicy::Fallback);
        let mut rec = record(40);
        rec.remove("cp");
        assert!(service.predict(&rec, ModelKind::Logistic).is_err());
    }
}
