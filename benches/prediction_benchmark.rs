//! Criterion benchmarks for the prediction pipeline
//!
//! These benchmarks measure:
//! - Record encoding against the feature schema
//! - Standard scaling
//! - End-to-end prediction per model

use cardio_predict::{
    config::ArtifactConfig,
    ml::{ArtifactBundle, ModelKind, PredictionService, RawRecord, UnknownModelPolicy},
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::PathBuf;
use std::sync::Arc;

fn service() -> PredictionService {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts");
    let bundle = ArtifactBundle::load(&ArtifactConfig::default().with_dir(dir))
        .expect("frozen artifacts load");
    PredictionService::new(Arc::new(bundle), UnknownModelPolicy::Fallback)
}

fn record() -> RawRecord {
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

fn bench_encode(c: &mut Criterion) {
    let service = service();
    let record = record();

    c.bench_function("encode_record", |b| {
        b.iter(|| service.encode(black_box(&record)).unwrap());
    });
}

fn bench_scale(c: &mut Criterion) {
    let service = service();
    let encoded = service.encode(&record()).unwrap();
    let scaler = service.bundle().scaler();

    c.bench_function("scale_vector", |b| {
        b.iter(|| scaler.transform(black_box(&encoded)).unwrap());
    });
}

fn bench_predict(c: &mut Criterion) {
    let service = service();
    let record = record();
    let mut group = c.benchmark_group("predict");

    for kind in [ModelKind::Logistic, ModelKind::DecisionTree] {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, kind| {
            b.iter(|| service.predict(black_box(&record), *kind).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_scale, bench_predict);
criterion_main!(benches);
