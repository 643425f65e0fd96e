use crate::error::{AppError, Result};
use crate::ml::models::{Diagnosis, ModelKind, ModelMetadata};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait for the pre-trained binary classifiers
pub trait Classifier: Send + Sync {
    /// Probability of the positive class
    fn predict_proba(&self, features: ArrayView1<'_, f64>) -> Result<f64>;

    /// Predict the class label
    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<Diagnosis>;

    /// Input width the model was fitted on
    fn n_features(&self) -> usize;

    /// Get model type
    fn model_kind(&self) -> ModelKind;

    /// Get model metadata
    fn metadata(&self) -> ModelMetadata;
}

fn check_width(expected: usize, features: &ArrayView1<'_, f64>) -> Result<()> {
    if features.len() != expected {
        return Err(AppError::Shape {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&text)
        .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))
}

fn check_classes(artifact: &str, classes: &[i64]) -> Result<()> {
    if classes != [0, 1] {
        return Err(AppError::artifact(
            artifact,
            format!("expected binary classes [0, 1], found {:?}", classes),
        ));
    }
    Ok(())
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Logistic regression exported as coefficients and intercept
#[derive(Debug, Clone)]
pub struct LogisticRegressionModel {
    classes: Vec<i64>,
    coefficients: Array1<f64>,
    intercept: f64,
}

#[derive(Deserialize)]
struct LogisticFile {
    #[serde(default = "default_classes")]
    classes: Vec<i64>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        Self::with_classes(default_classes(), coefficients, intercept)
    }

    fn with_classes(classes: Vec<i64>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        check_classes("logistic regression", &classes)?;
        if coefficients.is_empty() {
            return Err(AppError::artifact("logistic regression", "no coefficients"));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::artifact(
                "logistic regression",
                "coefficients must be finite",
            ));
        }

        Ok(Self {
            classes,
            coefficients: Array1::from(coefficients),
            intercept,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file: LogisticFile = read_artifact(path)?;
        Self::with_classes(file.classes, file.coefficients, file.intercept)
    }

    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        check_width(self.n_features(), &features)?;
        Ok(self.coefficients.dot(&features) + self.intercept)
    }
}

impl Classifier for LogisticRegressionModel {
    fn predict_proba(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let z = self.decision_function(features)?;
        Ok(1.0 / (1.0 + (-z).exp()))
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<Diagnosis> {
        let z = self.decision_function(features)?;
        let label = if z > 0.0 { self.classes[1] } else { self.classes[0] };
        Diagnosis::from_label(label)
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn model_kind(&self) -> ModelKind {
        ModelKind::Logistic
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            kind: ModelKind::Logistic,
            name: ModelKind::Logistic.display_name().to_string(),
            n_features: self.n_features(),
            scaled_input: ModelKind::Logistic.uses_scaled_input(),
            parameters: self.coefficients.len() + 1,
        }
    }
}

/// Node of a flattened binary decision tree.
///
/// Leaves have `left == right == -1`. Internal nodes send a sample left when
/// `x[feature] <= threshold`. `value` holds per-class training counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub left: i64,
    pub right: i64,
    pub feature: i64,
    pub threshold: f64,
    pub value: Vec<f64>,
}

impl TreeNode {
    pub fn internal(feature: usize, threshold: f64, left: usize, right: usize) -> Self {
        Self {
            left: left as i64,
            right: right as i64,
            feature: feature as i64,
            threshold,
            value: Vec::new(),
        }
    }

    pub fn leaf(negatives: f64, positives: f64) -> Self {
        Self {
            left: -1,
            right: -1,
            feature: -1,
            threshold: 0.0,
            value: vec![negatives, positives],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left < 0 && self.right < 0
    }
}

/// Decision tree exported as a flat node array, root at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeModel {
    #[serde(default = "default_classes")]
    classes: Vec<i64>,
    n_features: usize,
    nodes: Vec<TreeNode>,
}

impl DecisionTreeModel {
    pub fn new(n_features: usize, nodes: Vec<TreeNode>) -> Result<Self> {
        let model = Self {
            classes: default_classes(),
            n_features,
            nodes,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let model: Self = read_artifact(path)?;
        model.validate()?;
        Ok(model)
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Children always point forward, which rules out cycles
    fn validate(&self) -> Result<()> {
        const ARTIFACT: &str = "decision tree";

        check_classes(ARTIFACT, &self.classes)?;
        if self.nodes.is_empty() {
            return Err(AppError::artifact(ARTIFACT, "no nodes"));
        }

        let n_nodes = self.nodes.len() as i64;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                if node.value.len() != 2 {
                    return Err(AppError::artifact(
                        ARTIFACT,
                        format!("leaf {} has {} class counts", i, node.value.len()),
                    ));
                }
                let total: f64 = node.value.iter().sum();
                if total.is_nan() || total <= 0.0 || node.value.iter().any(|v| *v < 0.0) {
                    return Err(AppError::artifact(
                        ARTIFACT,
                        format!("leaf {} has invalid class counts", i),
                    ));
                }
                continue;
            }

            let i = i as i64;
            if node.left <= i || node.right <= i || node.left >= n_nodes || node.right >= n_nodes {
                return Err(AppError::artifact(
                    ARTIFACT,
                    format!("node {} has out-of-order children", i),
                ));
            }
            if node.feature < 0 || node.feature as usize >= self.n_features {
                return Err(AppError::artifact(
                    ARTIFACT,
                    format!(
                        "node {} splits on feature {} of {}",
                        i, node.feature, self.n_features
                    ),
                ));
            }
            if !node.threshold.is_finite() {
                return Err(AppError::artifact(
                    ARTIFACT,
                    format!("node {} has a non-finite threshold", i),
                ));
            }
        }

        Ok(())
    }

    /// Walk from the root to the leaf that `features` falls into
    fn leaf_for(&self, features: &ArrayView1<'_, f64>) -> Result<&TreeNode> {
        check_width(self.n_features, features)?;

        let mut node = &self.nodes[0];
        while !node.is_leaf() {
            let next = if features[node.feature as usize] <= node.threshold {
                node.left
            } else {
                node.right
            };
            node = &self.nodes[next as usize];
        }
        Ok(node)
    }
}

impl Classifier for DecisionTreeModel {
    fn predict_proba(&self, features: ArrayView1<'_, f64>) -> Result<f64> {
        let leaf = self.leaf_for(&features)?;
        let total: f64 = leaf.value.iter().sum();
        Ok(leaf.value[1] / total)
    }

    fn predict(&self, features: ArrayView1<'_, f64>) -> Result<Diagnosis> {
        let leaf = self.leaf_for(&features)?;
        // ties go to the first class
        let label = if leaf.value[1] > leaf.value[0] {
            self.classes[1]
        } else {
            self.classes[0]
        };
        Diagnosis::from_label(label)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn model_kind(&self) -> ModelKind {
        ModelKind::DecisionTree
    }

    fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            kind: ModelKind::DecisionTree,
            name: ModelKind::DecisionTree.display_name().to_string(),
            n_features: self.n_features,
            scaled_input: ModelKind::DecisionTree.uses_scaled_input(),
            parameters: self.nodes.len(),
        }
    }
}
