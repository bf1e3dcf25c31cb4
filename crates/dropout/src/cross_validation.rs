//! Stratified k-fold cross-validation.
//!
//! Folds preserve the class ratio of the full data: each class is split
//! into `k` contiguous blocks (optionally after a seeded shuffle) and fold
//! `i` takes block `i` of every class.

use log::warn;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::error::ModelError;
use crate::estimator::{DecisionFunction, Fit};
use crate::metrics::roc_auc;
use crate::util::{group_classes, take_labels, take_rows};
use crate::LOG_TARGET;

/// One train/test partition of the rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Rows used for fitting, ascending.
    pub train: Vec<usize>,
    /// Held-out rows, ascending.
    pub test: Vec<usize>,
}

/// Class-balanced k-fold splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    /// Number of folds, at least 2.
    pub n_splits: usize,
    /// Seed for shuffling rows within each class; `None` keeps input order.
    pub shuffle: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: None,
        }
    }

    /// Shuffle rows within each class before assigning folds.
    pub fn with_shuffle(self, seed: u64) -> Self {
        Self {
            shuffle: Some(seed),
            ..self
        }
    }

    /// Partition the rows of `labels` into `n_splits` train/test splits.
    pub fn split(&self, labels: ArrayView1<f64>) -> Result<Vec<Split>, ModelError> {
        let l = labels.len();
        let nr_fold = self.n_splits;

        if nr_fold < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "n-fold cross validation: n must >= 2 (got {})",
                nr_fold
            )));
        }
        if nr_fold > l {
            return Err(ModelError::InvalidParameter(format!(
                "# folds ({}) > # data ({})",
                nr_fold, l
            )));
        }

        let grouped = group_classes(labels);
        let mut classes = vec![grouped.negative, grouped.positive];
        classes.retain(|rows| !rows.is_empty());

        if let Some(min) = classes.iter().map(Vec::len).min() {
            if min < nr_fold {
                warn!(
                    target: LOG_TARGET,
                    "the least populated class has only {} members, fewer than n_splits = {}",
                    min, nr_fold
                );
            }
        }

        if let Some(seed) = self.shuffle {
            let mut rng = StdRng::seed_from_u64(seed);
            for rows in classes.iter_mut() {
                rows.shuffle(&mut rng);
            }
        }

        let mut fold_of = vec![0usize; l];
        for rows in &classes {
            let count = rows.len();
            for i in 0..nr_fold {
                let begin = (i * count) / nr_fold;
                let end = ((i + 1) * count) / nr_fold;
                for &row in &rows[begin..end] {
                    fold_of[row] = i;
                }
            }
        }

        let splits = (0..nr_fold)
            .map(|i| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..l).partition(|&row| fold_of[row] == i);
                Split { train, test }
            })
            .collect();
        Ok(splits)
    }
}

fn score_split<E>(
    estimator: &E,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    split: &Split,
) -> Result<f64, ModelError>
where
    E: Fit,
    E::Fitted: DecisionFunction,
{
    let x_train = take_rows(x, &split.train);
    let y_train = take_labels(y, &split.train);
    let model = estimator.fit(x_train.view(), y_train.view())?;

    let x_test = take_rows(x, &split.test);
    let y_test = take_labels(y, &split.test);
    let scores = model.decision_function(x_test.view())?;
    roc_auc(y_test.view(), scores.view())
}

/// Fit `estimator` on each split's training rows and return the AUC of its
/// decision values on the held-out rows, one entry per split.
///
/// With the `rayon` feature the splits are evaluated in parallel; the
/// result order always matches `splits`.
pub fn cross_val_auc<E>(
    estimator: &E,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    splits: &[Split],
) -> Result<Vec<f64>, ModelError>
where
    E: Fit + Sync,
    E::Fitted: DecisionFunction,
{
    if x.nrows() != y.len() {
        return Err(ModelError::rows(x.nrows(), y.len()));
    }

    #[cfg(feature = "rayon")]
    let scores = splits
        .par_iter()
        .map(|split| score_split(estimator, x, y, split))
        .collect();

    #[cfg(not(feature = "rayon"))]
    let scores = splits
        .iter()
        .map(|split| score_split(estimator, x, y, split))
        .collect();

    scores
}

/// Mean of per-split scores weighted by held-out fold size.
pub fn fold_weighted_mean(scores: &[f64], splits: &[Split]) -> f64 {
    let total: usize = splits.iter().map(|s| s.test.len()).sum();
    if total == 0 {
        return 0.0;
    }
    scores
        .iter()
        .zip(splits.iter())
        .map(|(&score, split)| score * split.test.len() as f64)
        .sum::<f64>()
        / total as f64
}

// ─── Tests ───────────────────────────────────────────────────────────
