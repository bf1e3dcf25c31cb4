//! Column standardization.
//!
//! A fitted scaler stores per-column mean and scale so the exact training
//! transformation can be replayed on test data (and persisted in the cache
//! with the rest of a pipeline).

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::estimator::Transform;
use crate::util::check_width;

/// Rescales every column to zero mean and unit variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column mean of the training data.
    pub mean: Array1<f64>,
    /// Per-column population standard deviation; 1 for constant columns.
    pub scale: Array1<f64>,
}

impl StandardScaler {
    /// Learn column means and standard deviations from `x`.
    pub fn fit(x: ArrayView2<f64>) -> Result<Self, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::InvalidInput(
                "cannot fit a scaler on zero rows".into(),
            ));
        }
        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ModelError::InvalidInput("empty matrix".into()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        Ok(Self { mean, scale })
    }

    /// Fit on `x` and return the transformed copy alongside the scaler.
    pub fn fit_transform(x: ArrayView2<f64>) -> Result<(Self, Array2<f64>), ModelError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }
}

impl Transform for StandardScaler {
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        check_width(x, self.n_features())?;
        Ok((&x - &self.mean) / &self.scale)
    }
}
