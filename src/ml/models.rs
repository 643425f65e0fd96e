use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// The two pre-trained classifiers the service can dispatch to
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[strum(serialize = "logistic")]
    Logistic,
    #[strum(to_string = "tree", serialize = "decision_tree")]
    DecisionTree,
}

impl ModelKind {
    /// Name shown to the user next to the prediction
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Logistic => "Logistic Regression",
            ModelKind::DecisionTree => "Decision Tree",
        }
    }

    /// Logistic regression was fitted on standardized inputs; the tree on raw encoded ones
    pub fn uses_scaled_input(&self) -> bool {
        matches!(self, ModelKind::Logistic)
    }

    /// Map a user-supplied model name onto a variant.
    ///
    /// Matching is exact. Names that match neither variant are routed to the
    /// decision tree under [`UnknownModelPolicy::Fallback`] and rejected under
    /// [`UnknownModelPolicy::Reject`].
    pub fn resolve(name: &str, policy: UnknownModelPolicy) -> Result<Self> {
        if let Ok(kind) = name.parse::<ModelKind>() {
            return Ok(kind);
        }

        match policy {
            UnknownModelPolicy::Fallback => {
                tracing::warn!(
                    requested = %name,
                    "Unknown model name, falling back to decision tree"
                );
                Ok(ModelKind::DecisionTree)
            }
            UnknownModelPolicy::Reject => Err(AppError::Validation(format!(
                "unknown model '{}', expected 'logistic' or 'tree'",
                name
            ))),
        }
    }
}

/// Handling of model names outside the closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownModelPolicy {
    /// Route to the decision tree
    #[default]
    Fallback,
    /// Answer with a validation error
    Reject,
}

/// Binary outcome of a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnosis {
    NoDisease,
    DiseasePresent,
}

impl Diagnosis {
    /// Interpret a class label produced by a model
    pub fn from_label(label: i64) -> Result<Self> {
        match label {
            0 => Ok(Diagnosis::NoDisease),
            1 => Ok(Diagnosis::DiseasePresent),
            other => Err(AppError::Internal(format!(
                "classifier produced label {} outside {{0, 1}}",
                other
            ))),
        }
    }

    pub fn label(&self) -> u8 {
        match self {
            Diagnosis::NoDisease => 0,
            Diagnosis::DiseasePresent => 1,
        }
    }

    /// User-facing text
    pub fn message(&self) -> &'static str {
        match self {
            Diagnosis::NoDisease => "No Heart Disease",
            Diagnosis::DiseasePresent => "Heart Disease Present",
        }
    }
}

/// Prediction result with the model that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted outcome
    pub diagnosis: Diagnosis,

    /// Model that produced the outcome
    pub model: ModelKind,

    /// Estimated probability of the positive class (0.0 - 1.0)
    pub probability: f64,
}

impl Prediction {
    pub fn new(diagnosis: Diagnosis, model: ModelKind, probability: f64) -> Self {
        Self {
            diagnosis,
            model,
            probability,
        }
    }

    pub fn message(&self) -> &'static str {
        self.diagnosis.message()
    }

    pub fn model_used(&self) -> &'static str {
        self.model.display_name()
    }
}

/// Description of a loaded model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub kind: ModelKind,
    pub name: String,
    pub n_features: usize,
    pub scaled_input: bool,
    /// Free-form size hint (coefficients or tree nodes)
    pub parameters: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("logistic".parse::<ModelKind>().unwrap(), ModelKind::Logistic);
        assert_eq!("tree".parse::<ModelKind>().unwrap(), ModelKind::DecisionTree);
        assert_eq!(
            "decision_tree".parse::<ModelKind>().unwrap(),
            ModelKind::DecisionTree
        );
        assert!("Logistic".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_unknown_model_falls_back_to_tree() {
        let kind = ModelKind::resolve("random_forest", UnknownModelPolicy::Fallback).unwrap();
        assert_eq!(kind, ModelKind::DecisionTree);
        assert_eq!(kind.display_name(), "Decision Tree");
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = ModelKind::resolve("random_forest", UnknownModelPolicy::Reject).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        // known names are unaffected by the policy
        assert_eq!(
            ModelKind::resolve("logistic", UnknownModelPolicy::Reject).unwrap(),
            ModelKind::Logistic
        );
    }

    #[test]
    fn test_scaled_input_asymmetry() {
        let scaled: Vec<_> = ModelKind::iter().filter(|k| k.uses_scaled_input()).collect();
        assert_eq!(scaled, vec![ModelKind::Logistic]);
    }

    #[test]
    fn test_diagnosis_labels() {
        assert_eq!(Diagnosis::from_label(1).unwrap().message(), "Heart Disease Present");
        assert_eq!(Diagnosis::from_label(0).unwrap().message(), "No Heart Disease");
        assert!(Diagnosis::from_label(2).is_err());
        assert_eq!(Diagnosis::DiseasePresent.label(), 1);
    }

    #[test]
    fn test_display_round_trip() {
        assert_eq!(ModelKind::DecisionTree.to_string(), "tree");
        assert_eq!(ModelKind::Logistic.as_ref(), "logistic");
    }
}
