//! Startup checks over deliberately broken artifact directories.

mod common;

use cardio_predict::{config::ArtifactConfig, ml::ArtifactBundle, AppError};
use common::*;
use std::fs;
use tempfile::TempDir;

/// Copy the frozen artifacts into a scratch directory
fn scratch_artifacts() -> (TempDir, ArtifactConfig) {
    let dir = TempDir::new().unwrap();
    let config = ArtifactConfig::default().with_dir(dir.path());

    let source = artifact_config();
    fs::copy(source.features_path(), config.features_path()).unwrap();
    fs::copy(source.scaler_path(), config.scaler_path()).unwrap();
    fs::copy(source.logistic_path(), config.logistic_path()).unwrap();
    fs::copy(source.tree_path(), config.tree_path()).unwrap();

    (dir, config)
}

#[test]
fn test_frozen_artifacts_load() {
    let bundle = ArtifactBundle::load(&artifact_config()).unwrap();

    assert_eq!(bundle.schema().len(), 22);
    assert_eq!(bundle.scaler().n_features(), 22);
    assert_eq!(bundle.registry().metadata().len(), 2);
}

#[test]
fn test_missing_artifact_fails() {
    let (_dir, config) = scratch_artifacts();
    fs::remove_file(config.tree_path()).unwrap();

    assert!(ArtifactBundle::load(&config).is_err());
}

#[test]
fn test_malformed_model_fails() {
    let (_dir, config) = scratch_artifacts();
    fs::write(config.logistic_path(), "{ not json").unwrap();

    let err = ArtifactBundle::load(&config).err().unwrap();
    assert!(matches!(err, AppError::Artifact { .. }));
}

#[test]
fn test_scaler_width_drift_fails() {
    let (_dir, config) = scratch_artifacts();
    fs::write(
        config.scaler_path(),
        r#"{"mean": [54.0, 131.0], "scale": [9.0, 17.5]}"#,
    )
    .unwrap();

    let err = ArtifactBundle::load(&config).err().unwrap();
    assert!(matches!(
        err,
        AppError::Shape {
            expected: 22,
            actual: 2
        }
    ));
}

#[test]
fn test_schema_width_drift_fails() {
    let (_dir, config) = scratch_artifacts();
    // drop the last column; every fitted artifact still expects 22
    let text = fs::read_to_string(config.features_path()).unwrap();
    let mut file: serde_json::Value = serde_json::from_str(&text).unwrap();
    file["columns"].as_array_mut().unwrap().pop();
    fs::write(config.features_path(), file.to_string()).unwrap();

    assert!(ArtifactBundle::load(&config).is_err());
}

#[test]
fn test_tree_with_backward_child_fails() {
    let (_dir, config) = scratch_artifacts();
    let text = fs::read_to_string(config.tree_path()).unwrap();
    let mut tree: serde_json::Value = serde_json::from_str(&text).unwrap();
    tree["nodes"][1]["left"] = serde_json::json!(0);
    fs::write(config.tree_path(), tree.to_string()).unwrap();

    let err = ArtifactBundle::load(&config).err().unwrap();
    assert!(matches!(err, AppError::Artifact { .. }));
}

#[test]
fn test_bare_column_array_accepted() {
    let (_dir, config) = scratch_artifacts();
    let text = fs::read_to_string(config.features_path()).unwrap();
    let file: serde_json::Value = serde_json::from_str(&text).unwrap();
    fs::write(config.features_path(), file["columns"].to_string()).unwrap();

    let bundle = ArtifactBundle::load(&config).unwrap();
    assert_eq!(bundle.schema().len(), 22);
}
