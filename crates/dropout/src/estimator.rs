//! Estimator capabilities shared by every model in the crate.
//!
//! Training code depends on these traits rather than on concrete models, so
//! cross-validation, randomized search, feature elimination and calibration
//! work with any estimator that exposes the pieces they need.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::ModelError;

/// An unfitted estimator: a bundle of hyperparameters that can be fitted.
pub trait Fit {
    /// The model produced by fitting.
    type Fitted;

    /// Fit to a feature matrix and aligned binary labels.
    fn fit(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Self::Fitted, ModelError>;
}

/// A fitted model that produces a real-valued score per row.
///
/// Larger scores rank a row as more likely positive. AUC scoring and
/// calibration only rely on this ordering.
pub trait DecisionFunction {
    fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError>;
}

/// A fitted model that predicts the positive-class probability per row.
pub trait ProbabilisticClassifier {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError>;
}

/// A fitted model exposing one weight per input column.
///
/// Used by recursive feature elimination to rank columns.
pub trait Coefficients {
    fn coefficients(&self) -> ArrayView1<'_, f64>;
}

/// An estimator with an inverse regularization strength `C`.
pub trait Regularized: Sized {
    fn cost(&self) -> f64;

    /// Copy of `self` with `C` replaced.
    fn with_cost(&self, c: f64) -> Self;
}

/// A fitted column-wise transformation.
pub trait Transform {
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError>;
}

impl<T: ProbabilisticClassifier + ?Sized> ProbabilisticClassifier for &T {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        (**self).predict_proba(x)
    }
}

impl<T: ProbabilisticClassifier + ?Sized> ProbabilisticClassifier for Box<T> {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        (**self).predict_proba(x)
    }
}
