use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dropout_rs::calibration::IsotonicRegression;
use dropout_rs::{Fit, LinearSvc, LogisticRegression};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn blobs(n: usize, d: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(7);
    let noise = Normal::new(0.0, 1.0).expect("unit normal");
    let y = Array1::from_shape_fn(n, |i| (i % 2) as f64);
    let x = Array2::from_shape_fn((n, d), |(i, _)| {
        let centre = if i % 2 == 1 { 0.5 } else { -0.5 };
        centre + noise.sample(&mut rng)
    });
    (x, y)
}

fn bench_train_linear_svc(c: &mut Criterion) {
    let (x, y) = blobs(2000, 40);
    let param = LinearSvc::default();

    c.bench_function("train_linear_svc", |b| {
        b.iter(|| param.fit(black_box(x.view()), black_box(y.view())))
    });
}

fn bench_train_logistic(c: &mut Criterion) {
    let (x, y) = blobs(2000, 40);
    let param = LogisticRegression::default();

    c.bench_function("train_logistic", |b| {
        b.iter(|| param.fit(black_box(x.view()), black_box(y.view())))
    });
}

fn bench_isotonic(c: &mut Criterion) {
    let (x, y) = blobs(5000, 1);
    let scores = x.column(0).to_vec();
    let labels = y.to_vec();

    c.bench_function("fit_isotonic", |b| {
        b.iter(|| IsotonicRegression::fit(black_box(&scores), black_box(&labels)))
    });
}

criterion_group!(
    benches,
    bench_train_linear_svc,
    bench_train_logistic,
    bench_isotonic
);
criterion_main!(benches);
