//! Grid search over C for the linear SVM using 5-fold stratified AUC.
//!
//! Run:
//!   cargo run -p dropout-rs --example c_grid_search

use dropout_rs::cross_validation::{cross_val_auc, fold_weighted_mean, StratifiedKFold};
use dropout_rs::metrics::accuracy_percentage;
use dropout_rs::{Fit, LinearSvc, Regularized};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() {
    let mut rng = StdRng::seed_from_u64(0);
    let noise = Normal::new(0.0, 1.0).expect("unit normal");
    let y = Array1::from_shape_fn(400, |i| (i % 2) as f64);
    let x = Array2::from_shape_fn((400, 6), |(i, j)| {
        let shift = if j < 2 { 0.6 } else { 0.0 };
        let sign = if i % 2 == 1 { 1.0 } else { -1.0 };
        sign * shift + noise.sample(&mut rng)
    });

    let splits = StratifiedKFold::new(5)
        .split(y.view())
        .expect("failed to build folds");
    let c_values = [0.01, 0.1, 1.0, 10.0, 100.0];

    println!("{:>8} {:>10} {:>12}", "C", "CV AUC", "train acc");

    let mut best = (c_values[0], -1.0f64);
    for &c in &c_values {
        let param = LinearSvc::default().with_cost(c);
        let scores = cross_val_auc(&param, x.view(), y.view(), &splits).expect("cv failed");
        let auc = fold_weighted_mean(&scores, &splits);

        let model = param.fit(x.view(), y.view()).expect("training failed");
        let predictions = model.predict(x.view()).expect("prediction failed");
        let acc = accuracy_percentage(predictions.view(), y.view());

        println!("{:>8.2} {:>10.4} {:>11.2}%", c, auc, acc);

        if auc > best.1 {
            best = (c, auc);
        }
    }

    println!("\nBest parameters: C={:.2}, CV AUC={:.4}", best.0, best.1);
}
