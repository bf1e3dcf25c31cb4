//! Randomized hyperparameter search over the cost parameter `C`.
//!
//! Candidates are drawn from an exponential prior with a seeded generator,
//! scored by stratified k-fold AUC and the best one is refit on every row.

use log::debug;
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cross_validation::{cross_val_auc, fold_weighted_mean, Split, StratifiedKFold};
use crate::error::ModelError;
use crate::estimator::{DecisionFunction, Fit, Regularized};
use crate::util::check_fit_input;
use crate::LOG_TARGET;

/// Randomized search for `C` on any regularized estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizedSearchCv<E> {
    /// Template estimator; only its `C` changes between candidates.
    pub base: E,
    /// Number of sampled candidates.
    pub n_iter: usize,
    /// Number of stratified folds.
    pub folds: usize,
    /// Rate of the exponential prior on `C` (mean `1 / rate`).
    pub rate: f64,
    /// Seed for candidate sampling.
    pub seed: u64,
}

impl<E> RandomizedSearchCv<E> {
    /// 50 candidates, `C ~ Exp(1)`, 5 folds.
    pub fn new(base: E, seed: u64) -> Self {
        Self {
            base,
            n_iter: 50,
            folds: 5,
            rate: 1.0,
            seed,
        }
    }
}

/// Cross-validated score of a single candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub c: f64,
    /// Mean AUC over folds, weighted by held-out fold size.
    pub mean: f64,
    pub fold_scores: Vec<f64>,
}

/// Outcome of a randomized search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult<E, M> {
    /// Every candidate in sampling order.
    pub grid_scores: Vec<CandidateScore>,
    /// Winning `C` (first candidate on ties).
    pub best_c: f64,
    pub best_score: f64,
    /// Template estimator with the winning `C`.
    pub best_params: E,
    /// `best_params` refit on all rows.
    pub best_estimator: M,
}

impl<E> RandomizedSearchCv<E>
where
    E: Fit + Regularized + Clone + Sync,
    E::Fitted: DecisionFunction,
{
    /// Draw the candidate values of `C`. Zero draws are redrawn so every
    /// candidate is a valid cost.
    pub fn sample_costs(&self) -> Result<Vec<f64>, ModelError> {
        let prior = Exp::new(self.rate)
            .map_err(|e| ModelError::InvalidParameter(format!("exponential rate: {}", e)))?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut costs = Vec::with_capacity(self.n_iter);
        while costs.len() < self.n_iter {
            let c: f64 = prior.sample(&mut rng);
            if c > 0.0 && c.is_finite() {
                costs.push(c);
            }
        }
        Ok(costs)
    }

    pub fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<SearchResult<E, E::Fitted>, ModelError> {
        if self.n_iter == 0 {
            return Err(ModelError::InvalidParameter("n_iter == 0".into()));
        }
        check_fit_input(x, y)?;

        let costs = self.sample_costs()?;
        let splits = StratifiedKFold::new(self.folds).split(y)?;

        #[cfg(feature = "rayon")]
        let grid_scores: Vec<CandidateScore> = costs
            .par_iter()
            .map(|&c| self.score_candidate(c, x, y, &splits))
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "rayon"))]
        let grid_scores: Vec<CandidateScore> = costs
            .iter()
            .map(|&c| self.score_candidate(c, x, y, &splits))
            .collect::<Result<_, _>>()?;

        for candidate in &grid_scores {
            debug!(
                target: LOG_TARGET,
                "mean: {:.5}, std: {:.5}, params: {{'C': {}}}",
                candidate.mean,
                std_dev(&candidate.fold_scores),
                candidate.c
            );
        }

        let mut best = 0;
        for (i, candidate) in grid_scores.iter().enumerate() {
            if candidate.mean > grid_scores[best].mean {
                best = i;
            }
        }
        let best_c = grid_scores[best].c;
        let best_score = grid_scores[best].mean;
        let best_params = self.base.with_cost(best_c);
        let best_estimator = best_params.fit(x, y)?;

        Ok(SearchResult {
            grid_scores,
            best_c,
            best_score,
            best_params,
            best_estimator,
        })
    }

    fn score_candidate(
        &self,
        c: f64,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        splits: &[Split],
    ) -> Result<CandidateScore, ModelError> {
        let fold_scores = cross_val_auc(&self.base.with_cost(c), x, y, splits)?;
        let mean = fold_weighted_mean(&fold_scores, splits);
        Ok(CandidateScore {
            c,
            mean,
            fold_scores,
        })
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt()
}
