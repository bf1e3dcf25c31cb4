//! Probability calibration of decision values.
//!
//! `CalibratedClassifierCv` fits the base estimator once per stratified fold
//! and maps its held-out decision values onto probabilities with either an
//! isotonic fit (pool adjacent violators) or Platt's sigmoid. At prediction
//! time the per-fold probabilities are averaged.

use log::debug;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::cross_validation::StratifiedKFold;
use crate::error::ModelError;
use crate::estimator::{DecisionFunction, Fit, ProbabilisticClassifier};
use crate::types::CalibrationMethod;
use crate::util::{check_fit_input, is_positive, take_labels, take_rows};
use crate::LOG_TARGET;

// ─── Isotonic regression ─────────────────────────────────────────────

/// Monotone non-decreasing step fit with linear interpolation between
/// thresholds. Inputs outside the fitted range are clipped to its ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicRegression {
    /// Ascending distinct inputs kept after pooling.
    pub x_thresholds: Vec<f64>,
    /// Fitted value at each threshold, non-decreasing.
    pub y_thresholds: Vec<f64>,
}

impl IsotonicRegression {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::rows(x.len(), y.len()));
        }
        if x.is_empty() {
            return Err(ModelError::InvalidInput(
                "isotonic regression needs at least one point".into(),
            ));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidInput(
                "non-finite value in isotonic input".into(),
            ));
        }

        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));

        // Collapse tied inputs into one weighted point.
        let mut xs: Vec<f64> = Vec::new();
        let mut sums: Vec<f64> = Vec::new();
        let mut weights: Vec<f64> = Vec::new();
        for &i in &order {
            let tied = xs.last() == Some(&x[i]);
            match (tied, sums.last_mut(), weights.last_mut()) {
                (true, Some(s), Some(w)) => {
                    *s += y[i];
                    *w += 1.0;
                }
                _ => {
                    xs.push(x[i]);
                    sums.push(y[i]);
                    weights.push(1.0);
                }
            }
        }

        let fitted = pool_adjacent_violators(&sums, &weights);

        // Interior points of a flat run carry no information for
        // interpolation; keep only the run endpoints.
        let mut x_thresholds = Vec::with_capacity(xs.len());
        let mut y_thresholds = Vec::with_capacity(xs.len());
        for i in 0..xs.len() {
            let flat_before = i > 0 && fitted[i - 1] == fitted[i];
            let flat_after = i + 1 < xs.len() && fitted[i + 1] == fitted[i];
            if !(flat_before && flat_after) {
                x_thresholds.push(xs[i]);
                y_thresholds.push(fitted[i]);
            }
        }

        Ok(Self {
            x_thresholds,
            y_thresholds,
        })
    }

    /// Interpolated fit at `v`, clipped to the fitted range.
    pub fn predict_one(&self, v: f64) -> f64 {
        let xs = &self.x_thresholds;
        let ys = &self.y_thresholds;
        let last = xs.len() - 1;
        if v <= xs[0] {
            return ys[0];
        }
        if v >= xs[last] {
            return ys[last];
        }
        // First threshold strictly greater than v; 1 <= hi <= last here.
        let hi = xs.partition_point(|&t| t <= v);
        let lo = hi - 1;
        let span = xs[hi] - xs[lo];
        ys[lo] + (ys[hi] - ys[lo]) * (v - xs[lo]) / span
    }

    pub fn predict(&self, values: ArrayView1<f64>) -> Array1<f64> {
        values.mapv(|v| self.predict_one(v))
    }
}

/// Weighted pool-adjacent-violators on per-point sums and weights.
/// Returns the non-decreasing fitted value for every point.
fn pool_adjacent_violators(sums: &[f64], weights: &[f64]) -> Vec<f64> {
    // Each block: (sum, weight, number of points)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(sums.len());
    for (&s, &w) in sums.iter().zip(weights.iter()) {
        blocks.push((s, w, 1));
        while blocks.len() > 1 {
            let n = blocks.len();
            let (s1, w1, c1) = blocks[n - 1];
            let (s0, w0, c0) = blocks[n - 2];
            if s0 / w0 <= s1 / w1 {
                break;
            }
            blocks.truncate(n - 2);
            blocks.push((s0 + s1, w0 + w1, c0 + c1));
        }
    }

    let mut fitted = Vec::with_capacity(sums.len());
    for (s, w, count) in blocks {
        fitted.extend(std::iter::repeat(s / w).take(count));
    }
    fitted
}

// ─── Platt scaling ───────────────────────────────────────────────────

/// Sigmoid `P(y=1|f) = 1/(1+exp(A*f+B))` fitted to decision values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaling {
    pub a: f64,
    pub b: f64,
}

impl PlattScaling {
    /// Fit `(A, B)` by Newton's method with backtracking (Lin, Lin & Weng
    /// 2007), using smoothed targets `(N+ + 1)/(N+ + 2)` and `1/(N- + 2)`.
    pub fn fit(dec_values: &[f64], labels: &[f64]) -> Result<Self, ModelError> {
        if dec_values.len() != labels.len() {
            return Err(ModelError::rows(dec_values.len(), labels.len()));
        }
        let l = dec_values.len();

        let prior1 = labels.iter().filter(|&&y| is_positive(y)).count() as f64;
        let prior0 = l as f64 - prior1;

        let max_iter = 100;
        let min_step = 1e-10;
        let sigma = 1e-12;
        let eps = 1e-5;

        let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
        let lo_target = 1.0 / (prior0 + 2.0);
        let t: Vec<f64> = labels
            .iter()
            .map(|&y| if is_positive(y) { hi_target } else { lo_target })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            dec_values
                .iter()
                .zip(t.iter())
                .map(|(&f, &ti)| {
                    let f_apb = f * a + b;
                    if f_apb >= 0.0 {
                        ti * f_apb + (-f_apb).exp().ln_1p()
                    } else {
                        (ti - 1.0) * f_apb + f_apb.exp().ln_1p()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..max_iter {
            // Gradient and Hessian (H' = H + σI)
            let mut h11 = sigma;
            let mut h22 = sigma;
            let mut h21 = 0.0;
            let mut g1 = 0.0;
            let mut g2 = 0.0;
            for (&f, &ti) in dec_values.iter().zip(t.iter()) {
                let f_apb = f * a + b;
                let (p, q) = if f_apb >= 0.0 {
                    let e = (-f_apb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = f_apb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = ti - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < eps && g2.abs() < eps {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut stepsize = 1.0;
            while stepsize >= min_step {
                let new_a = a + stepsize * da;
                let new_b = b + stepsize * db;
                let newf = objective(new_a, new_b);
                if newf < fval + 0.0001 * stepsize * gd {
                    a = new_a;
                    b = new_b;
                    fval = newf;
                    break;
                }
                stepsize /= 2.0;
            }

            if stepsize < min_step {
                debug!(target: LOG_TARGET, "line search fails in Platt scaling");
                break;
            }
        }

        Ok(Self { a, b })
    }

    pub fn predict_one(&self, decision_value: f64) -> f64 {
        let f_apb = decision_value * self.a + self.b;
        if f_apb >= 0.0 {
            (-f_apb).exp() / (1.0 + (-f_apb).exp())
        } else {
            1.0 / (1.0 + f_apb.exp())
        }
    }
}

// ─── Cross-validated calibration ─────────────────────────────────────

/// A fitted mapping from decision values to probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Calibrator {
    Isotonic(IsotonicRegression),
    Sigmoid(PlattScaling),
}

impl Calibrator {
    pub fn fit(
        method: CalibrationMethod,
        dec_values: &[f64],
        labels: &[f64],
    ) -> Result<Self, ModelError> {
        match method {
            CalibrationMethod::Isotonic => {
                let targets: Vec<f64> = labels
                    .iter()
                    .map(|&y| if is_positive(y) { 1.0 } else { 0.0 })
                    .collect();
                Ok(Calibrator::Isotonic(IsotonicRegression::fit(
                    dec_values, &targets,
                )?))
            }
            CalibrationMethod::Sigmoid => {
                Ok(Calibrator::Sigmoid(PlattScaling::fit(dec_values, labels)?))
            }
        }
    }

    pub fn predict(&self, dec_values: ArrayView1<f64>) -> Array1<f64> {
        let proba = match self {
            Calibrator::Isotonic(iso) => iso.predict(dec_values),
            Calibrator::Sigmoid(platt) => dec_values.mapv(|f| platt.predict_one(f)),
        };
        proba.mapv(|p| p.clamp(0.0, 1.0))
    }
}

/// Calibrates a base estimator with held-out folds.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedClassifierCv<E> {
    pub base: E,
    pub method: CalibrationMethod,
    /// Number of stratified folds.
    pub folds: usize,
}

impl<E> CalibratedClassifierCv<E> {
    pub fn new(base: E, method: CalibrationMethod) -> Self {
        Self {
            base,
            method,
            folds: 5,
        }
    }
}

/// One fold's model with the calibrator fitted on its held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedFold<M> {
    pub model: M,
    pub calibrator: Calibrator,
}

/// Ensemble of calibrated fold models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedModel<M> {
    pub method: CalibrationMethod,
    pub folds: Vec<CalibratedFold<M>>,
}

impl<E> Fit for CalibratedClassifierCv<E>
where
    E: Fit,
    E::Fitted: DecisionFunction,
{
    type Fitted = CalibratedModel<E::Fitted>;

    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<CalibratedModel<E::Fitted>, ModelError> {
        check_fit_input(x, y)?;
        let splits = StratifiedKFold::new(self.folds).split(y)?;

        let mut folds = Vec::with_capacity(splits.len());
        for (i, split) in splits.iter().enumerate() {
            let x_train = take_rows(x, &split.train);
            let y_train = take_labels(y, &split.train);
            let model = self.base.fit(x_train.view(), y_train.view())?;

            let x_test = take_rows(x, &split.test);
            let y_test = take_labels(y, &split.test);
            let dec = model.decision_function(x_test.view())?;
            let calibrator = Calibrator::fit(self.method, &dec.to_vec(), &y_test.to_vec())?;
            debug!(
                target: LOG_TARGET,
                "calibrated fold {} on {} held-out rows ({:?})",
                i,
                split.test.len(),
                self.method
            );
            folds.push(CalibratedFold { model, calibrator });
        }

        Ok(CalibratedModel {
            method: self.method,
            folds,
        })
    }
}

impl<M: DecisionFunction> ProbabilisticClassifier for CalibratedModel<M> {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        let mut total = Array1::<f64>::zeros(x.nrows());
        for fold in &self.folds {
            let dec = fold.model.decision_function(x)?;
            total += &fold.calibrator.predict(dec.view());
        }
        if !self.folds.is_empty() {
            total /= self.folds.len() as f64;
        }
        Ok(total)
    }
}
