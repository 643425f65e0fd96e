use crate::error::{AppError, Result};
use crate::ml::features::FeatureVector;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fitted per-column standardization `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

#[derive(Deserialize)]
struct ScalerFile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(AppError::artifact("scaler", "no fitted columns"));
        }
        if mean.len() != scale.len() {
            return Err(AppError::artifact(
                "scaler",
                format!("{} means but {} scales", mean.len(), scale.len()),
            ));
        }
        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(AppError::artifact(
                "scaler",
                format!("mean of column {} is not finite", i),
            ));
        }
        // zero-variance columns are stored with scale 1.0 at fit time
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(AppError::artifact(
                "scaler",
                format!("scale of column {} is zero or not finite", i),
            ));
        }

        Ok(Self {
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    /// Load from a JSON file with `mean` and `scale` arrays
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))?;
        let file: ScalerFile = serde_json::from_str(&text)
            .map_err(|e| AppError::artifact(path.display().to_string(), e.to_string()))?;
        Self::new(file.mean, file.scale)
    }

    /// Fitted dimensionality
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        if features.len() != self.n_features() {
            return Err(AppError::Shape {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        let scaled = (features.values() - &self.mean) / &self.scale;
        features.with_values(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn vector(values: Vec<f64>) -> FeatureVector {
        let columns: Arc<[String]> = (0..values.len()).map(|i| format!("c{}", i)).collect();
        FeatureVector::new(columns, Array1::from(values)).unwrap()
    }

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![10.0, 0.5], vec![2.0, 0.5]).unwrap();
        let scaled = scaler.transform(&vector(vec![14.0, 0.0])).unwrap();

        assert_eq!(scaled.values().to_vec(), vec![2.0, -1.0]);
        assert_eq!(scaled.columns(), &["c0".to_string(), "c1".to_string()]);
    }

    #[test]
    fn test_shape_mismatch() {
        let scaler = StandardScaler::new(vec![0.0, 0.0, 0.0], vec![1.0, 1.0, 1.0]).unwrap();
        let err = scaler.transform(&vector(vec![1.0, 2.0])).unwrap_err();

        assert!(matches!(
            err,
            AppError::Shape {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(StandardScaler::new(vec![], vec![]).is_err());
        assert!(StandardScaler::new(vec![0.0], vec![1.0, 1.0]).is_err());
        assert!(StandardScaler::new(vec![0.0], vec![0.0]).is_err());
        assert!(StandardScaler::new(vec![f64::NAN], vec![1.0]).is_err());
    }

    #[test]
    fn test_transform_is_deterministic() {
        let scaler = StandardScaler::new(vec![54.37, 131.62], vec![9.07, 17.51]).unwrap();
        let input = vector(vec![63.0, 145.0]);

        let first = scaler.transform(&input).unwrap();
        let second = scaler.transform(&input).unwrap();
        assert_eq!(
            first.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }
}
