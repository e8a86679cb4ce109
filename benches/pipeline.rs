//! Pipeline benchmark: URL → features → schema-ordered vector → verdict.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use phishguard::config::DetectorConfig;
use phishguard::features::{assemble, FeatureExtractor, FeatureSchema};
use phishguard::model::{Classifier, LabelModel, ModelError};
use phishguard::Detector;
use std::sync::Arc;

const URLS: &[&str] = &[
    "https://www.example.com/",
    "http://192.168.1.1/login",
    "https://secure-paypal-verify.com/update?session=abc&id=12345#top",
    "paypal.com.account-verify.xkcdqwrtzpl.co.uk/signin/confirm",
    "http://[::1]:8080/admin;jsessionid=1?redirect=https://evil.example",
];

struct AlwaysSafe;

impl LabelModel for AlwaysSafe {
    fn predict(&self, _features: &[f32]) -> Result<i64, ModelError> {
        Ok(0)
    }
}

fn bench_feature_extraction(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();

    c.bench_function("feature_extract_5_urls", |b| {
        b.iter(|| {
            for url in URLS {
                black_box(extractor.extract(black_box(url)));
            }
        })
    });
}

fn bench_assemble(c: &mut Criterion) {
    let extractor = FeatureExtractor::default();
    let schema = FeatureSchema::builtin();
    let mapping = extractor.extract(URLS[2]).into_mapping();

    c.bench_function("assemble_builtin_schema", |b| {
        b.iter(|| black_box(assemble(black_box(&mapping), schema)))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let detector = Detector::new(
        Arc::new(FeatureSchema::builtin().clone()),
        Classifier::LabelOnly(Box::new(AlwaysSafe)),
        &DetectorConfig::default(),
    );

    c.bench_function("full_pipeline_url_to_verdict", |b| {
        b.iter(|| {
            for url in URLS {
                let _ = black_box(detector.classify(black_box(url)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_feature_extraction,
    bench_assemble,
    bench_full_pipeline
);
criterion_main!(benches);
