/// Heart disease inference pipeline
///
/// This module turns a patient's clinical measurements into a prediction:
/// - Statically declared input fields and the trained feature schema
/// - One-hot encoding aligned to the feature schema
/// - Standard scaling with fitted parameters
/// - Logistic regression and decision tree classifiers loaded from JSON artifacts
/// - A prediction service that routes each model to the input it was fitted on

pub mod classifier;
pub mod features;
pub mod models;
pub mod registry;
pub mod scaler;
pub mod schema;
pub mod service;

pub use classifier::{Classifier, DecisionTreeModel, LogisticRegressionModel, TreeNode};
pub use features::{encode, FeatureEncoder, FeatureVector};
pub use models::{Diagnosis, ModelKind, ModelMetadata, Prediction, UnknownModelPolicy};
pub use registry::{ArtifactBundle, ModelRegistry};
pub use scaler::StandardScaler;
pub use schema::{FeatureSchema, FieldKind, FieldSpec, FieldValue, InputSchema, RawRecord};
pub use service::PredictionService;
