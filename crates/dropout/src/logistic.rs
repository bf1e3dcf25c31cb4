//! L2-penalized binary logistic regression.
//!
//! Minimizes `C·Σ logloss(y_i, w·x_i + b) + ½‖w‖²` by Newton's method with
//! a backtracking line search, the same scheme Platt scaling uses for its
//! two parameters. The intercept is not penalized. Also provides
//! `LogisticRegressionCv`, which picks `C` from a grid by cross-validated AUC.

use log::{debug, warn};
use ndarray::{concatenate, s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_linalg::{FactorizeC, SolveC, UPLO};
use serde::{Deserialize, Serialize};

use crate::cross_validation::{cross_val_auc, StratifiedKFold};
use crate::error::ModelError;
use crate::estimator::{Coefficients, DecisionFunction, Fit, ProbabilisticClassifier, Regularized};
use crate::types::LogisticRegression;
use crate::util::{check_fit_input, check_width, is_positive, log1p_exp, sigmoid};
use crate::LOG_TARGET;

/// A fitted logistic model: `P(y=1|x) = σ(w·x + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    /// Parameters used during training.
    pub param: LogisticRegression,
    /// One weight per input column.
    pub coef: Array1<f64>,
    /// Intercept, 0 when `fit_intercept` is off.
    pub intercept: f64,
    /// Newton iterations used.
    pub n_iter: usize,
}

impl LogisticModel {
    pub fn n_features(&self) -> usize {
        self.coef.len()
    }
}

impl Fit for LogisticRegression {
    type Fitted = LogisticModel;

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<LogisticModel, ModelError> {
        self.validate()?;
        check_fit_input(x, y)?;

        let targets: Array1<f64> = y.mapv(|v| if is_positive(v) { 1.0 } else { 0.0 });
        let design = if self.fit_intercept {
            let ones = Array2::<f64>::ones((x.nrows(), 1));
            concatenate(Axis(1), &[x.view(), ones.view()])
                .map_err(|e| ModelError::InvalidInput(e.to_string()))?
        } else {
            x.to_owned()
        };

        let (beta, n_iter) = newton(&design, &targets, self);

        let p = x.ncols();
        let intercept = if self.fit_intercept { beta[p] } else { 0.0 };
        Ok(LogisticModel {
            param: self.clone(),
            coef: beta.slice(s![..p]).to_owned(),
            intercept,
            n_iter,
        })
    }
}

impl Regularized for LogisticRegression {
    fn cost(&self) -> f64 {
        self.c
    }

    fn with_cost(&self, c: f64) -> Self {
        Self { c, ..self.clone() }
    }
}

impl DecisionFunction for LogisticModel {
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_width(x, self.n_features())?;
        Ok(x.dot(&self.coef) + self.intercept)
    }
}

impl ProbabilisticClassifier for LogisticModel {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.decision_function(x)?.mapv(sigmoid))
    }
}

impl Coefficients for LogisticModel {
    fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coef.view()
    }
}

// ─── Newton solver ───────────────────────────────────────────────────

/// Penalty weight per coefficient: 1 for feature weights, 0 for the
/// intercept column (always last when present).
fn penalty_mask(dim: usize, fit_intercept: bool) -> Array1<f64> {
    let mut mask = Array1::<f64>::ones(dim);
    if fit_intercept {
        mask[dim - 1] = 0.0;
    }
    mask
}

fn objective(
    design: &Array2<f64>,
    t: &Array1<f64>,
    beta: &Array1<f64>,
    mask: &Array1<f64>,
    c: f64,
) -> f64 {
    let z = design.dot(beta);
    let loss: f64 = z
        .iter()
        .zip(t.iter())
        .map(|(&zi, &ti)| log1p_exp(zi) - ti * zi)
        .sum();
    let penalty: f64 = beta
        .iter()
        .zip(mask.iter())
        .map(|(&b, &m)| m * b * b)
        .sum();
    c * loss + 0.5 * penalty
}

fn newton(
    design: &Array2<f64>,
    t: &Array1<f64>,
    param: &LogisticRegression,
) -> (Array1<f64>, usize) {
    let dim = design.ncols();
    let c = param.c;
    let mask = penalty_mask(dim, param.fit_intercept);

    let min_step = 1e-10;
    let mut beta = Array1::<f64>::zeros(dim);
    let mut fval = objective(design, t, &beta, &mask, c);
    let mut grad_scale = None;
    let mut iter = 0usize;

    while iter < param.max_iter {
        let p = design.dot(&beta).mapv(sigmoid);
        let grad = design.t().dot(&(&p - t)) * c + &mask * &beta;

        let g_max = grad.iter().fold(0.0f64, |acc, g| acc.max(g.abs()));
        let scale = *grad_scale.get_or_insert(g_max.max(1.0));
        if g_max <= param.tol * scale {
            break;
        }

        // H = C·Xᵀ S X + diag(mask), S = diag(p(1-p))
        let s_diag = p.mapv(|pi| pi * (1.0 - pi));
        let weighted = design * &s_diag.insert_axis(Axis(1));
        let mut hessian = design.t().dot(&weighted) * c;
        for k in 0..dim {
            hessian[[k, k]] += mask[k];
        }

        let descent = grad.mapv(|g| -g);
        let direction = match solve_spd(&hessian, &descent) {
            Ok(d) => d,
            Err(e) => {
                debug!(
                    target: LOG_TARGET,
                    "Newton system failed ({}), taking a gradient step (C = {})", e, c
                );
                descent
            }
        };
        let gd = grad.dot(&direction);

        // Line search with step-size halving
        let mut stepsize = 1.0;
        while stepsize >= min_step {
            let candidate = &beta + &(&direction * stepsize);
            let newf = objective(design, t, &candidate, &mask, c);
            if newf < fval + 0.0001 * stepsize * gd {
                beta = candidate;
                fval = newf;
                break;
            }
            stepsize /= 2.0;
        }

        iter += 1;
        if stepsize < min_step {
            debug!(target: LOG_TARGET, "line search fails in logistic regression (C = {})", c);
            break;
        }
    }

    if iter >= param.max_iter {
        warn!(
            target: LOG_TARGET,
            "logistic regression reached max_iter = {} (C = {})", param.max_iter, c
        );
    }

    (beta, iter)
}

/// Solve `A x = b` for symmetric positive definite `A` by Cholesky.
///
/// When the factorization fails, it is retried once with a tiny diagonal
/// jitter. Hessians can be semi-definite in the intercept direction.
fn solve_spd(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
    let x = match a.factorizec(UPLO::Lower) {
        Ok(factor) => factor.solvec(b)?,
        Err(_) => {
            let n = a.nrows();
            let jitter = 1e-10 * (a.diag().sum() / n as f64).max(1.0);
            let damped = a + &(Array2::<f64>::eye(n) * jitter);
            damped.factorizec(UPLO::Lower)?.solvec(b)?
        }
    };
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(ModelError::InvalidInput("non-finite Newton direction".into()))
    }
}

// ─── Cross-validated C selection ─────────────────────────────────────

/// Logistic regression whose `C` is chosen by stratified k-fold AUC.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionCv {
    /// Candidate values of `C`, tried in order.
    pub cs: Vec<f64>,
    /// Number of stratified folds.
    pub folds: usize,
    /// Template for every fit; its `c` is overridden by each candidate.
    pub base: LogisticRegression,
}

impl Default for LogisticRegressionCv {
    fn default() -> Self {
        Self {
            cs: log_space(-4.0, 4.0, 10),
            folds: 10,
            base: LogisticRegression::default(),
        }
    }
}

/// Outcome of `LogisticRegressionCv::fit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticCvModel {
    /// The candidate grid.
    pub cs: Vec<f64>,
    /// Mean cross-validated AUC per candidate.
    pub scores: Vec<f64>,
    /// Candidate with the highest mean score (first one on ties).
    pub best_c: f64,
    /// Model refit on all rows at `best_c`.
    pub model: LogisticModel,
}

impl Fit for LogisticRegressionCv {
    type Fitted = LogisticCvModel;

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<LogisticCvModel, ModelError> {
        if self.cs.is_empty() {
            return Err(ModelError::InvalidParameter("empty C grid".into()));
        }
        check_fit_input(x, y)?;

        let splits = StratifiedKFold::new(self.folds).split(y)?;

        let mut scores = Vec::with_capacity(self.cs.len());
        for &c in &self.cs {
            let fold_scores = cross_val_auc(&self.base.with_cost(c), x, y, &splits)?;
            let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
            debug!(target: LOG_TARGET, "C = {:e}: mean AUC = {:.6}", c, mean);
            scores.push(mean);
        }

        let mut best = 0;
        for (i, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = i;
            }
        }
        let best_c = self.cs[best];
        let model = self.base.with_cost(best_c).fit(x, y)?;

        Ok(LogisticCvModel {
            cs: self.cs.clone(),
            scores,
            best_c,
            model,
        })
    }
}

impl ProbabilisticClassifier for LogisticCvModel {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        self.model.predict_proba(x)
    }
}

/// `num` values spaced evenly on a log10 scale from `10^start` to `10^stop`.
pub fn log_space(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![10f64.powf(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| 10f64.powf(start + step * i as f64))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{separable, two_blobs};
    use crate::metrics::roc_auc;
    use ndarray::array;

    #[test]
    fn log_space_matches_default_grid() {
        let cs = log_space(-4.0, 4.0, 10);
        assert_eq!(cs.len(), 10);
        assert!((cs[0] - 1e-4).abs() < 1e-18);
        assert!((cs[9] - 1e4).abs() < 1e-8);
        for pair in cs.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn gradient_vanishes_at_solution() {
        let (x, y) = two_blobs(60, 3, 5);
        let param = LogisticRegression {
            tol: 1e-8,
            ..Default::default()
        };
        let model = param.fit(x.view(), y.view()).unwrap();

        let p = model.predict_proba(x.view()).unwrap();
        let resid = &p - &y;
        // Unpenalized intercept: residuals sum to zero at the optimum.
        assert!(resid.sum().abs() < 1e-5, "residual sum {}", resid.sum());
        // Feature weights balance the penalty: C·Xᵀr + w = 0.
        let g = x.t().dot(&resid) * param.c + &model.coef;
        for gi in g.iter() {
            assert!(gi.abs() < 1e-5, "gradient component {}", gi);
        }
    }

    #[test]
    fn separable_data_is_ranked_perfectly() {
        let (x, y) = separable(40, 3);
        let model = LogisticRegression::default().fit(x.view(), y.view()).unwrap();
        let p = model.predict_proba(x.view()).unwrap();
        assert_eq!(roc_auc(y.view(), p.view()).unwrap(), 1.0);
        for &pi in p.iter() {
            assert!((0.0..=1.0).contains(&pi));
        }
    }

    #[test]
    fn stronger_penalty_shrinks_coefficients() {
        let (x, y) = two_blobs(80, 2, 9);
        let small = LogisticRegression::default().with_cost(1e-3).fit(x.view(), y.view()).unwrap();
        let large = LogisticRegression::default().with_cost(1e3).fit(x.view(), y.view()).unwrap();
        assert!(small.coef.dot(&small.coef) < large.coef.dot(&large.coef));
    }

    #[test]
    fn without_intercept_model_passes_through_origin() {
        let (x, y) = two_blobs(40, 2, 1);
        let param = LogisticRegression {
            fit_intercept: false,
            ..Default::default()
        };
        let model = param.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.intercept, 0.0);
        let origin = Array2::<f64>::zeros((1, 2));
        let p = model.predict_proba(origin.view()).unwrap();
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn spd_solve_matches_small_system() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, &b).unwrap();
        let back = a.dot(&x);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn spd_solve_rejects_indefinite_matrix() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        let err = solve_spd(&a, &array![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, ModelError::Linalg(_)));
    }

    #[test]
    fn spd_solve_retries_semidefinite_matrix_with_jitter() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        let x = solve_spd(&a, &array![2.0, 2.0]).unwrap();
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn fit_borrows_caller_view_for_intercept_column() {
        let (x, y) = two_blobs(30, 2, 4);
        let view = x.slice(s![.., ..]);
        let model = LogisticRegression::default().fit(view, y.view()).unwrap();
        assert_eq!(model.coef.len(), 2);
        assert!(model.intercept.is_finite());
    }

    #[test]
    fn cv_picks_a_grid_value_and_reports_every_score() {
        let (x, y) = two_blobs(60, 3, 21);
        let cv = LogisticRegressionCv {
            folds: 3,
            ..Default::default()
        };
        let fitted = cv.fit(x.view(), y.view()).unwrap();
        assert_eq!(fitted.scores.len(), 10);
        assert!(fitted.cs.contains(&fitted.best_c));
        let best = fitted.scores.iter().cloned().fold(f64::MIN, f64::max);
        let idx = fitted.cs.iter().position(|&c| c == fitted.best_c).unwrap();
        assert_eq!(fitted.scores[idx], best);
        assert_eq!(fitted.model.param.c, fitted.best_c);
    }

    #[test]
    fn cv_rejects_empty_grid() {
        let (x, y) = two_blobs(20, 2, 2);
        let cv = LogisticRegressionCv {
            cs: Vec::new(),
            ..Default::default()
        };
        assert!(cv.fit(x.view(), y.view()).is_err());
    }
}
