//! Shared internal utilities for dropout-rs.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::ModelError;

/// Row indices of a binary label vector, grouped by class.
#[derive(Debug, Clone)]
pub(crate) struct GroupedClasses {
    /// Rows labelled positive (`y > 0`), in input order.
    pub positive: Vec<usize>,
    /// Rows labelled negative, in input order.
    pub negative: Vec<usize>,
}

/// Group rows into negative and positive blocks.
///
/// Any label `> 0` counts as the positive class, so both `{0, 1}` and
/// `{-1, +1}` encodings are accepted.
pub(crate) fn group_classes(labels: ArrayView1<f64>) -> GroupedClasses {
    let mut positive = Vec::new();
    let mut negative = Vec::new();
    for (i, &y) in labels.iter().enumerate() {
        if is_positive(y) {
            positive.push(i);
        } else {
            negative.push(i);
        }
    }
    GroupedClasses { positive, negative }
}

#[inline]
pub(crate) fn is_positive(label: f64) -> bool {
    label > 0.0
}

/// Map labels onto the `{-1, +1}` encoding used by the solvers.
pub(crate) fn signed_labels(labels: ArrayView1<f64>) -> Vec<f64> {
    labels
        .iter()
        .map(|&y| if is_positive(y) { 1.0 } else { -1.0 })
        .collect()
}

/// Validate a training pair before fitting.
///
/// Rows must align, the matrix must be non-empty, and both classes must be
/// present (a binary classifier cannot be fitted on one class).
pub(crate) fn check_fit_input(x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::rows(x.nrows(), y.len()));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::InvalidInput("empty training matrix".into()));
    }
    let grouped = group_classes(y);
    if grouped.positive.is_empty() || grouped.negative.is_empty() {
        return Err(ModelError::InvalidInput(
            "training data contains only one class".into(),
        ));
    }
    Ok(())
}

/// Check that a matrix has the width a fitted model expects.
pub(crate) fn check_width(x: ArrayView2<f64>, expected: usize) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::columns(expected, x.ncols()));
    }
    Ok(())
}

pub(crate) fn take_rows(x: ArrayView2<f64>, rows: &[usize]) -> Array2<f64> {
    x.select(Axis(0), rows)
}

pub(crate) fn take_labels(y: ArrayView1<f64>, rows: &[usize]) -> Array1<f64> {
    y.select(Axis(0), rows)
}

pub(crate) fn take_columns(x: ArrayView2<f64>, columns: &[usize]) -> Array2<f64> {
    x.select(Axis(1), columns)
}

/// Numerically stable logistic function.
#[inline]
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable `ln(1 + exp(z))`.
#[inline]
pub(crate) fn log1p_exp(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}
