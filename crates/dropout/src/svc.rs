//! Linear support vector classification.
//!
//! Trains an L2-regularized, squared-hinge-loss SVM by coordinate descent on
//! the dual problem (Hsieh et al., ICML 2008), the method LIBLINEAR uses for
//! its `-s 1` solver. The intercept is learned as the weight of a synthetic
//! feature whose value is `param.bias`, so it is regularized like every other
//! weight.

use log::{debug, warn};
use ndarray::{s, Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::estimator::{Coefficients, DecisionFunction, Fit, Regularized};
use crate::types::LinearSvc;
use crate::util::{check_fit_input, check_width, signed_labels};
use crate::LOG_TARGET;

/// Result of the dual solver.
#[derive(Debug, Clone)]
pub struct SolutionInfo {
    /// Dual objective value at the returned point.
    pub obj: f64,
    /// Number of passes performed.
    pub iterations: usize,
    /// Number of non-zero dual variables (support vectors).
    pub n_sv: usize,
    /// Whether the projected-gradient gap fell below `eps`.
    pub converged: bool,
}

/// A fitted linear SVM: `f(x) = w·x + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvcModel {
    /// Parameters used during training.
    pub param: LinearSvc,
    /// One weight per input column.
    pub weights: Array1<f64>,
    /// Intercept (`bias * w_bias`), 0 when no bias feature was used.
    pub intercept: f64,
}

impl LinearSvcModel {
    /// Number of input columns the model was fitted on.
    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    /// Hard labels in `{0, 1}` from the sign of the decision value.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        let dec = self.decision_function(x)?;
        Ok(dec.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }))
    }
}

impl Fit for LinearSvc {
    type Fitted = LinearSvcModel;

    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<LinearSvcModel, ModelError> {
        self.validate()?;
        check_fit_input(x, y)?;

        let y = signed_labels(y);
        let (w, si) = solve_l2_loss_dual(x, &y, self);

        debug!(
            target: LOG_TARGET,
            "optimization finished, #iter = {}, obj = {}, nSV = {}",
            si.iterations, si.obj, si.n_sv
        );
        if !si.converged {
            warn!(target: LOG_TARGET, "reaching max number of iterations (C = {})", self.c);
        }

        let n = x.ncols();
        let intercept = if self.bias > 0.0 { w[n] * self.bias } else { 0.0 };
        Ok(LinearSvcModel {
            param: self.clone(),
            weights: w.slice(s![..n]).to_owned(),
            intercept,
        })
    }
}

impl Regularized for LinearSvc {
    fn cost(&self) -> f64 {
        self.c
    }

    fn with_cost(&self, c: f64) -> Self {
        Self { c, ..self.clone() }
    }
}

impl DecisionFunction for LinearSvcModel {
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        check_width(x, self.n_features())?;
        Ok(x.dot(&self.weights) + self.intercept)
    }
}

impl Coefficients for LinearSvcModel {
    fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }
}

/// Dual coordinate descent for the L2-loss SVM.
///
/// Solves `min_α ½αᵀ(Q + D)α − eᵀα, α ≥ 0` with `D_ii = 1/(2C)`, keeping the
/// primal vector `w = Σ α_i y_i x_i` up to date. `y` must be `±1`. Returns
/// `w` with the bias weight appended when `param.bias > 0`.
fn solve_l2_loss_dual(
    x: ArrayView2<f64>,
    y: &[f64],
    param: &LinearSvc,
) -> (Array1<f64>, SolutionInfo) {
    let l = x.nrows();
    let n = x.ncols();
    let bias = param.bias;
    let has_bias = bias > 0.0;
    let diag = 0.5 / param.c;

    let mut w = Array1::<f64>::zeros(n + usize::from(has_bias));
    let mut alpha = vec![0.0; l];
    let qd: Vec<f64> = x
        .rows()
        .into_iter()
        .map(|row| row.dot(&row) + bias * bias + diag)
        .collect();

    let mut index: Vec<usize> = (0..l).collect();
    let mut rng = StdRng::seed_from_u64(param.seed);
    let mut iter = 0usize;
    let mut converged = false;

    while iter < param.max_iter {
        index.shuffle(&mut rng);

        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;

        for &i in &index {
            let xi = x.row(i);
            let yi = y[i];

            let mut wx = xi.dot(&w.slice(s![..n]));
            if has_bias {
                wx += w[n] * bias;
            }
            let g = yi * wx - 1.0 + alpha[i] * diag;

            // No upper bound on α for the squared hinge, so only the lower
            // bound projects the gradient.
            let pg = if alpha[i] == 0.0 { g.min(0.0) } else { g };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > 1e-12 {
                let alpha_old = alpha[i];
                alpha[i] = (alpha[i] - g / qd[i]).max(0.0);
                let d = (alpha[i] - alpha_old) * yi;
                w.slice_mut(s![..n]).scaled_add(d, &xi);
                if has_bias {
                    w[n] += d * bias;
                }
            }
        }

        iter += 1;
        if pg_max - pg_min <= param.eps {
            converged = true;
            break;
        }
    }

    let obj = {
        let mut v = w.dot(&w);
        for &a in &alpha {
            v += a * (a * diag - 2.0);
        }
        v / 2.0
    };
    let n_sv = alpha.iter().filter(|&&a| a > 0.0).count();

    (
        w,
        SolutionInfo {
            obj,
            iterations: iter,
            n_sv,
            converged,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{separable, two_blobs};
    use crate::metrics::roc_auc;
    use ndarray::{array, Array2};

    #[test]
    fn separable_data_is_ranked_perfectly() {
        let (x, y) = separable(40, 3);
        let model = LinearSvc::default().fit(x.view(), y.view()).unwrap();
        let dec = model.decision_function(x.view()).unwrap();
        assert_eq!(roc_auc(y.view(), dec.view()).unwrap(), 1.0);

        let labels = model.predict(x.view()).unwrap();
        assert_eq!(labels, y);
    }

    #[test]
    fn weight_sign_follows_informative_column() {
        // Only column 0 carries signal; it should dominate the weights.
        let (x, y) = separable(60, 4);
        let model = LinearSvc::default().fit(x.view(), y.view()).unwrap();
        assert!(model.weights[0] > 0.0);
        for j in 1..4 {
            assert!(
                model.weights[0].abs() > model.weights[j].abs(),
                "column {} outweighs the informative column: {:?}",
                j,
                model.weights
            );
        }
    }

    #[test]
    fn smaller_c_shrinks_weights() {
        let (x, y) = two_blobs(80, 3, 7);
        let strong = LinearSvc::default()
            .with_cost(0.001)
            .fit(x.view(), y.view())
            .unwrap();
        let weak = LinearSvc::default()
            .with_cost(10.0)
            .fit(x.view(), y.view())
            .unwrap();
        let norm = |m: &LinearSvcModel| m.weights.dot(&m.weights).sqrt();
        assert!(norm(&strong) < norm(&weak));
    }

    #[test]
    fn fit_is_deterministic_for_fixed_seed() {
        let (x, y) = two_blobs(50, 3, 11);
        let a = LinearSvc::default().fit(x.view(), y.view()).unwrap();
        let b = LinearSvc::default().fit(x.view(), y.view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_bias_disables_intercept() {
        let (x, y) = two_blobs(30, 2, 3);
        let param = LinearSvc {
            bias: 0.0,
            ..Default::default()
        };
        let model = param.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.intercept, 0.0);
    }

    #[test]
    fn decision_function_rejects_wrong_width() {
        let (x, y) = separable(20, 3);
        let model = LinearSvc::default().fit(x.view(), y.view()).unwrap();
        let wide = Array2::<f64>::zeros((2, 4));
        let err = model.decision_function(wide.view()).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn single_class_training_is_rejected() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1.0, 1.0];
        assert!(LinearSvc::default().fit(x.view(), y.view()).is_err());
    }

    #[test]
    fn solver_reports_support_vectors() {
        let x = array![[2.0], [1.0], [-1.0], [-2.0]];
        let y = [1.0, 1.0, -1.0, -1.0];
        let (w, si) = solve_l2_loss_dual(x.view(), &y, &LinearSvc::default());
        assert!(si.converged);
        assert!(si.n_sv > 0);
        assert!(w[0] > 0.0);
    }
}
