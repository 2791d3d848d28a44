use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multimodal_svm::evaluation::ClassificationReport;
use multimodal_svm::training::{SVMClassifier, SVMConfig};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn create_classification_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<usize>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

    let labels: Vec<usize> = (0..n_rows).map(|i| i % 2).collect();
    let data: Vec<f64> = labels
        .iter()
        .flat_map(|&label| {
            let shift = label as f64 * 1.5;
            (0..n_features)
                .map(|_| rng.gen::<f64>() + shift)
                .collect::<Vec<_>>()
        })
        .collect();

    (
        Array2::from_shape_vec((n_rows, n_features), data).unwrap(),
        Array1::from(labels),
    )
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("svm_fit");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [100, 500, 1000].iter() {
        let data = create_classification_data(*n_rows, 300);

        group.bench_with_input(BenchmarkId::new("rbf", n_rows), &data, |b, (x, y)| {
            b.iter(|| {
                let mut clf = SVMClassifier::new(SVMConfig::default());
                clf.fit(black_box(x), black_box(y)).unwrap();
                clf
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("svm_predict");

    // Train model once
    let (train_x, train_y) = create_classification_data(500, 300);
    let mut clf = SVMClassifier::new(SVMConfig::default());
    clf.fit(&train_x, &train_y).unwrap();

    for n_rows in [100, 1000].iter() {
        let (x, _) = create_classification_data(*n_rows, 300);

        group.bench_with_input(BenchmarkId::new("rbf", n_rows), &x, |b, x| {
            b.iter(|| clf.predict(black_box(x)).unwrap())
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let y_true: Vec<usize> = (0..10_000).map(|i| i % 3).collect();
    let y_pred: Vec<usize> = (0..10_000).map(|i| (i * 7) % 3).collect();

    c.bench_function("classification_report", |b| {
        b.iter(|| ClassificationReport::compute(black_box(&y_true), black_box(&y_pred)).unwrap())
    });
}

criterion_group!(benches, bench_training, bench_prediction, bench_report);
criterion_main!(benches);
