use crate::config::ArtifactConfig;
use crate::error::{AppError, Result};
use crate::ml::classifier::{Classifier, DecisionTreeModel, LogisticRegressionModel};
use crate::ml::features::FeatureVector;
use crate::ml::models::{ModelKind, ModelMetadata, Prediction};
use crate::ml::scaler::StandardScaler;
use crate::ml::schema::{FeatureSchema, InputSchema};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// The two pre-trained classifiers, addressed by [`ModelKind`]
pub struct ModelRegistry {
    logistic: LogisticRegressionModel,
    tree: DecisionTreeModel,
}

impl ModelRegistry {
    pub fn new(logistic: LogisticRegressionModel, tree: DecisionTreeModel) -> Self {
        Self { logistic, tree }
    }

    pub fn classifier(&self, kind: ModelKind) -> &dyn Classifier {
        match kind {
            ModelKind::Logistic => &self.logistic,
            ModelKind::DecisionTree => &self.tree,
        }
    }

    /// Run `kind` on a vector the caller has already prepared for it
    pub fn predict(&self, kind: ModelKind, features: &FeatureVector) -> Result<Prediction> {
        let classifier = self.classifier(kind);
        let diagnosis = classifier.predict(features.view())?;
        let probability = classifier.predict_proba(features.view())?;
        Ok(Prediction::new(diagnosis, kind, probability))
    }

    pub fn metadata(&self) -> Vec<ModelMetadata> {
        vec![self.logistic.metadata(), self.tree.metadata()]
    }
}

/// Everything loaded from disk at startup, immutable afterwards
pub struct ArtifactBundle {
    input: InputSchema,
    schema: Arc<FeatureSchema>,
    scaler: StandardScaler,
    registry: ModelRegistry,
    loaded_at: DateTime<Utc>,
}

impl ArtifactBundle {
    /// Assemble a bundle, checking every artifact against the feature schema width
    pub fn new(
        input: InputSchema,
        schema: FeatureSchema,
        scaler: StandardScaler,
        registry: ModelRegistry,
    ) -> Result<Self> {
        let width = schema.len();

        if scaler.n_features() != width {
            return Err(AppError::Shape {
                expected: width,
                actual: scaler.n_features(),
            });
        }
        for meta in registry.metadata() {
            if meta.n_features != width {
                return Err(AppError::artifact(
                    meta.name,
                    format!(
                        "fitted on {} features, schema has {}",
                        meta.n_features, width
                    ),
                ));
            }
        }

        let missing = schema.missing_passthrough(&input);
        if !missing.is_empty() {
            warn!(fields = ?missing, "Feature schema ignores continuous input fields");
        }

        Ok(Self {
            input,
            schema: Arc::new(schema),
            scaler,
            registry,
            loaded_at: Utc::now(),
        })
    }

    /// Load the four artifacts named in `config`
    pub fn load(config: &ArtifactConfig) -> Result<Self> {
        let input = InputSchema::heart();

        let schema = FeatureSchema::load(&config.features_path(), &input)?;
        info!(
            path = %config.features_path().display(),
            columns = schema.len(),
            "Loaded feature schema"
        );

        let scaler = StandardScaler::load(&config.scaler_path())?;
        info!(
            path = %config.scaler_path().display(),
            columns = scaler.n_features(),
            "Loaded scaler"
        );

        let logistic = LogisticRegressionModel::load(&config.logistic_path())?;
        info!(
            path = %config.logistic_path().display(),
            features = logistic.n_features(),
            "Loaded logistic regression model"
        );

        let tree = DecisionTreeModel::load(&config.tree_path())?;
        info!(
            path = %config.tree_path().display(),
            nodes = tree.n_nodes(),
            "Loaded decision tree model"
        );

        Self::new(input, schema, scaler, ModelRegistry::new(logistic, tree))
    }

    pub fn input(&self) -> InputSchema {
        self.input
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::TreeNode;
    use crate::ml::models::Diagnosis;
    use ndarray::Array1;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            vec!["age".to_string(), "sex_1".to_string()],
            &InputSchema::heart(),
        )
        .unwrap()
    }

    fn registry(width: usize) -> ModelRegistry {
        ModelRegistry::new(
            LogisticRegressionModel::new(vec![1.0; width], 0.0).unwrap(),
            DecisionTreeModel::new(width, vec![TreeNode::leaf(1.0, 3.0)]).unwrap(),
        )
    }

    #[test]
    fn test_registry_dispatch() {
        let registry = registry(2);
        assert_eq!(
            registry.classifier(ModelKind::Logistic).model_kind(),
            ModelKind::Logistic
        );
        assert_eq!(
            registry.classifier(ModelKind::DecisionTree).model_kind(),
            ModelKind::DecisionTree
        );

        let columns: Arc<[String]> = vec!["age".to_string(), "sex_1".to_string()].into();
        let vector = FeatureVector::new(columns, Array1::from(vec![-1.0, -1.0])).unwrap();

        let logistic = registry.predict(ModelKind::Logistic, &vector).unwrap();
        assert_eq!(logistic.diagnosis, Diagnosis::NoDisease);
        assert_eq!(logistic.model_used(), "Logistic Regression");

        let tree = registry.predict(ModelKind::DecisionTree, &vector).unwrap();
        assert_eq!(tree.diagnosis, Diagnosis::DiseasePresent);
        assert_eq!(tree.model_used(), "Decision Tree");
        assert!((tree.probability - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_bundle_rejects_scaler_drift() {
        let scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        let err = ArtifactBundle::new(InputSchema::heart(), schema(), scaler, registry(2))
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Shape { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_bundle_rejects_model_drift() {
        let scaler = StandardScaler::new(vec![0.0; 2], vec![1.0; 2]).unwrap();
        let err = ArtifactBundle::new(InputSchema::heart(), schema(), scaler, registry(4))
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "ARTIFACT_ERROR");
    }

    #[test]
    fn test_bundle_accepts_consistent_artifacts() {
        let scaler = StandardScaler::new(vec![0.0; 2], vec![1.0; 2]).unwrap();
        let bundle =
            ArtifactBundle::new(InputSchema::heart(), schema(), scaler, registry(2)).unwrap();
        assert_eq!(bundle.schema().len(), 2);
        assert_eq!(bundle.registry().metadata().len(), 2);
    }
}
