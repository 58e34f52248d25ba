// Criterion benchmarks for Craftwork ML

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use craftwork_ml::core::features::extract_features;
use craftwork_ml::core::price::PricePipeline;
use craftwork_ml::core::text;
use craftwork_ml::models::{CompletedProjectRow, ProjectFields};
use chrono::Utc;

fn sample_corpus(size: usize) -> Vec<String> {
    let themes = [
        "logo design branding identity for startup",
        "rust backend api service with postgres",
        "mobile app interface design and prototyping",
        "seo content writing for travel blog",
        "data pipeline etl automation in python",
    ];
    (0..size)
        .map(|i| format!("{} variant {}", themes[i % themes.len()], i))
        .collect()
}

fn completed_row(id: i64, words: usize, amount: f64) -> CompletedProjectRow {
    CompletedProjectRow {
        project_id: id,
        title: format!("Project {}", id),
        description: vec!["deliverable"; words].join(" "),
        budget: amount * 1.2,
        buyer_id: 1,
        project_created_at: Utc::now(),
        proposal_id: id * 10,
        proposal_price: amount * 0.9,
        delivery_time: 14,
        seller_id: id % 5 + 1,
        payment_id: id * 100,
        payment_amount: Some(amount),
        payment_status: "completed".to_string(),
        payment_date: Utc::now(),
    }
}

fn price_features() -> Vec<String> {
    [
        "category",
        "complexity",
        "duration",
        "required_skills",
        "budget",
        "initial_price",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn bench_feature_extraction(c: &mut Criterion) {
    let record = ProjectFields {
        description: Some(vec!["deliverable"; 150].join(" ")),
        category: Some("design".to_string()),
        budget: Some(500.0),
        ..Default::default()
    };

    c.bench_function("extract_features", |b| {
        b.iter(|| extract_features(black_box(&record)));
    });
}

fn bench_tfidf_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");

    for corpus_size in [10, 50, 200].iter() {
        let corpus = sample_corpus(*corpus_size);
        group.bench_with_input(
            BenchmarkId::new("fit_and_score", corpus_size),
            corpus_size,
            |b, _| {
                b.iter(|| {
                    let matrix = text::fit_transform(black_box(&corpus), 1);
                    let profile = matrix.mean_of(0..2);
                    matrix.similarities(&profile, 2..corpus.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_forest_predict(c: &mut Criterion) {
    let rows: Vec<CompletedProjectRow> = (0..50)
        .map(|i| completed_row(i, 20 + (i as usize % 10) * 30, 200.0 + i as f64 * 40.0))
        .collect();
    let (pipeline, _) = PricePipeline::fit(&rows, &price_features(), 50).unwrap();

    let record = ProjectFields {
        description: Some(vec!["deliverable"; 120].join(" ")),
        delivery_time: Some(21.0),
        budget: Some(800.0),
        ..Default::default()
    };

    c.bench_function("price_pipeline_predict", |b| {
        b.iter(|| pipeline.predict(black_box(&record)));
    });
}

criterion_group!(
    benches,
    bench_feature_extraction,
    bench_tfidf_scoring,
    bench_forest_predict
);

criterion_main!(benches);
