//! Benchmarks for classification, deterministic builds and normalization

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dcision::recipe::ExpectedShape;
use dcision::{
    BuildRequest, Classifier, ModelAssembler, Normalizer, ProblemCategory, ProblemDescription,
};

const PRODUCTION: &str = "A factory runs 3 production lines producing 20, 30 and 25 units/hour of widgets. \
    Operating costs are $10, $12 and $11 per hour. Meet demand of 500 units of widgets at minimum cost.";

const STAFFING: &str = "Roster nurses: we need 4 nurses for the morning shift, 3 nurses for the \
    evening shift and 2 nurses for the night shift. Each nurse costs $200 per shift.";

const PORTFOLIO: &str = "Allocate a budget of $1 million. Stocks return 8%, bonds return 4% \
    and real estate returns 6%, with at most 50% in any single asset.";

const TEXTS: [(&str, &str); 3] = [
    ("production", PRODUCTION),
    ("staffing", STAFFING),
    ("portfolio", PORTFOLIO),
];

/// Benchmark the signal-table classifier
fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::with_defaults();
    let mut group = c.benchmark_group("classify");

    for (name, text) in TEXTS {
        let description = ProblemDescription::new(text);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| black_box(classifier.classify(black_box(&description))))
        });
    }

    group.finish();
}

/// Benchmark the full deterministic path: classify, extract, check
fn bench_deterministic_build(c: &mut Criterion) {
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => panic!("failed to start runtime: {}", e),
    };
    let assembler = ModelAssembler::with_defaults(None);
    let mut group = c.benchmark_group("deterministic_build");

    for (name, text) in TEXTS {
        let request = BuildRequest::new(text);
        group.bench_function(name, |b| {
            b.iter(|| black_box(runtime.block_on(assembler.build(&request)).is_ok()))
        });
    }

    group.finish();
}

/// Benchmark each normalization strategy on its typical input
fn bench_normalize(c: &mut Criterion) {
    let normalizer = Normalizer::new();
    let shape = ExpectedShape::generic(ProblemCategory::Unknown);
    let strict = r#"{"variables": [{"name": "x", "role": "r"}, {"name": "y", "role": "r"}],
        "objective": {"direction": "maximize", "terms": [{"coefficient": 3, "variable": "x"}, {"coefficient": 2, "variable": "y"}]},
        "constraints": [{"name": "cap", "terms": [{"coefficient": 1, "variable": "x"}, {"coefficient": 1, "variable": "y"}], "relation": "<=", "rhs": 4}]}"#;
    let embedded = format!("Sure, here is the model:\n```json\n{}\n```\nLet me know.", strict);
    let scattered = r#"The decision variables are "variables": [{"name": "x", "role": "r"}]
        The objective is "objective": {"direction": "minimize", "terms": [{"coefficient": 1, "variable": "x"}]},
        and finally "constraints": [{"name": "floor", "terms": [{"coefficient": 1, "variable": "x"}], "relation": ">=", "rhs": 1}]"#;

    let mut group = c.benchmark_group("normalize");
    group.bench_function("strict_parse", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(strict), &shape).is_ok()))
    });
    group.bench_function("embedded_fragment", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&embedded), &shape).is_ok()))
    });
    group.bench_function("field_extraction", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(scattered), &shape).is_ok()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_deterministic_build,
    bench_normalize
);
criterion_main!(benches);
