//! Recursive feature elimination.
//!
//! The estimator is fitted repeatedly; after each fit the `step` surviving
//! columns with the smallest squared coefficient are dropped, until
//! `n_features_to_select` columns remain.

use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::estimator::{Coefficients, Fit, Transform};
use crate::util::{check_fit_input, check_width, take_columns};
use crate::LOG_TARGET;

/// Elimination schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rfe {
    pub n_features_to_select: usize,
    /// Columns removed per round.
    pub step: usize,
}

impl Rfe {
    pub fn new(n_features_to_select: usize) -> Self {
        Self {
            n_features_to_select,
            step: 1,
        }
    }
}

/// Which input columns survived elimination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// `true` for kept columns, indexed by input column.
    pub support: Vec<bool>,
    /// 1 for kept columns; larger values were eliminated earlier.
    pub ranking: Vec<usize>,
}

impl FeatureSelection {
    pub fn n_features_in(&self) -> usize {
        self.support.len()
    }

    /// Indices of the kept columns, ascending.
    pub fn selected(&self) -> Vec<usize> {
        self.support
            .iter()
            .enumerate()
            .filter_map(|(i, &keep)| keep.then_some(i))
            .collect()
    }
}

impl Transform for FeatureSelection {
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        check_width(x, self.n_features_in())?;
        Ok(take_columns(x, &self.selected()))
    }
}

/// Outcome of `Rfe::fit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfeFit<M> {
    pub selection: FeatureSelection,
    /// The estimator refit on the kept columns only.
    pub estimator: M,
}

impl Rfe {
    pub fn fit<E>(
        &self,
        estimator: &E,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<RfeFit<E::Fitted>, ModelError>
    where
        E: Fit,
        E::Fitted: Coefficients,
    {
        if self.step == 0 {
            return Err(ModelError::InvalidParameter("step must be >= 1".into()));
        }
        if self.n_features_to_select == 0 {
            return Err(ModelError::InvalidParameter(
                "n_features_to_select must be >= 1".into(),
            ));
        }
        check_fit_input(x, y)?;

        let n_features = x.ncols();
        let mut support = vec![true; n_features];
        let mut ranking = vec![1usize; n_features];

        loop {
            let remaining: Vec<usize> = (0..n_features).filter(|&j| support[j]).collect();
            if remaining.len() <= self.n_features_to_select {
                break;
            }

            let model = estimator.fit(take_columns(x, &remaining).view(), y)?;
            let coef = model.coefficients();
            let mut order: Vec<usize> = (0..remaining.len()).collect();
            order.sort_by(|&a, &b| (coef[a] * coef[a]).total_cmp(&(coef[b] * coef[b])));

            let threshold = self.step.min(remaining.len() - self.n_features_to_select);
            for &k in &order[..threshold] {
                support[remaining[k]] = false;
            }
            for j in 0..n_features {
                if !support[j] {
                    ranking[j] += 1;
                }
            }
            debug!(
                target: LOG_TARGET,
                "fitting estimator with {} features, eliminated {}",
                remaining.len(),
                threshold
            );
        }

        let selection = FeatureSelection { support, ranking };
        let estimator = estimator.fit(take_columns(x, &selection.selected()).view(), y)?;
        Ok(RfeFit {
            selection,
            estimator,
        })
    }
}
