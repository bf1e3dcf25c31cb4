//! Synthetic datasets shared by the unit tests.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Linearly separable data: column 0 carries the label with a margin of at
/// least 1, the remaining columns are small uniform noise.
///
/// Labels alternate `0, 1, 0, 1, ...`.
pub(crate) fn separable(n: usize, d: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut x = Array2::<f64>::zeros((n, d));
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let positive = i % 2 == 1;
        let magnitude = 1.0 + i as f64 / n as f64;
        x[[i, 0]] = if positive { magnitude } else { -magnitude };
        for j in 1..d {
            x[[i, j]] = rng.gen_range(-0.3..0.3);
        }
        y[i] = if positive { 1.0 } else { 0.0 };
    }
    (x, y)
}

/// Two overlapping Gaussian blobs centred at `±0.75` in every column.
pub(crate) fn two_blobs(n: usize, d: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 1.0).expect("unit normal");
    let mut x = Array2::<f64>::zeros((n, d));
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let positive = i % 2 == 1;
        let centre = if positive { 0.75 } else { -0.75 };
        for j in 0..d {
            x[[i, j]] = centre + noise.sample(&mut rng);
        }
        y[i] = if positive { 1.0 } else { 0.0 };
    }
    (x, y)
}
