use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// A labelled training set: one row of `features` per entry of `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Feature matrix, one row per enrollment.
    pub features: Array2<f64>,
    /// Binary label per row (`> 0` is positive).
    pub labels: Array1<f64>,
}

impl Dataset {
    /// Pair a feature matrix with its labels, checking row alignment.
    pub fn new(features: Array2<f64>, labels: Array1<f64>) -> Result<Self, ModelError> {
        if features.nrows() != labels.len() {
            return Err(ModelError::rows(features.nrows(), labels.len()));
        }
        Ok(Self { features, labels })
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }
}

/// The held-out records a submission is written for.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    /// Enrollment id per row of `features`, in the same order.
    pub ids: Vec<i64>,
    /// Test feature matrix.
    pub features: Array2<f64>,
}

impl TestSet {
    /// Pair ids with their feature rows.
    ///
    /// A length mismatch is rejected rather than silently truncated.
    pub fn new(ids: Vec<i64>, features: Array2<f64>) -> Result<Self, ModelError> {
        if ids.len() != features.nrows() {
            return Err(ModelError::ShapeMismatch {
                context: "test ids vs test rows",
                expected: features.nrows(),
                found: ids.len(),
            });
        }
        Ok(Self { ids, features })
    }
}

/// Hyperparameters of the linear support vector classifier.
///
/// Defaults follow the usual LIBLINEAR settings for the L2-regularized
/// squared-hinge loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvc {
    /// Cost parameter C.
    pub c: f64,
    /// Stopping tolerance on the projected-gradient gap.
    pub eps: f64,
    /// Maximum number of passes over the data.
    pub max_iter: usize,
    /// Value of the synthetic bias feature; 0 disables the intercept.
    pub bias: f64,
    /// Seed for the coordinate visiting order.
    pub seed: u64,
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self {
            c: 1.0,
            eps: 0.1,
            max_iter: 1000,
            bias: 1.0,
            seed: 0,
        }
    }
}

impl LinearSvc {
    /// Validate parameter values (independent of training data).
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ModelError::InvalidParameter("C <= 0".into()));
        }
        if self.eps <= 0.0 {
            return Err(ModelError::InvalidParameter("eps <= 0".into()));
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidParameter("max_iter == 0".into()));
        }
        if self.bias < 0.0 {
            return Err(ModelError::InvalidParameter("bias < 0".into()));
        }
        Ok(())
    }
}

/// Hyperparameters of L2-penalized binary logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength C.
    pub c: f64,
    /// Stopping tolerance on the largest gradient component.
    pub tol: f64,
    /// Maximum number of Newton iterations.
    pub max_iter: usize,
    /// Whether to fit an (unpenalized) intercept.
    pub fit_intercept: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            tol: 1e-4,
            max_iter: 100,
            fit_intercept: true,
        }
    }
}

impl LogisticRegression {
    /// Validate parameter values (independent of training data).
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(ModelError::InvalidParameter("C <= 0".into()));
        }
        if self.tol <= 0.0 {
            return Err(ModelError::InvalidParameter("tol <= 0".into()));
        }
        if self.max_iter == 0 {
            return Err(ModelError::InvalidParameter("max_iter == 0".into()));
        }
        Ok(())
    }
}

/// How decision values are mapped onto probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalibrationMethod {
    /// Non-parametric monotone fit (pool adjacent violators).
    Isotonic,
    /// Platt scaling: `P(y=1|f) = 1/(1+exp(A*f+B))`.
    Sigmoid,
}
