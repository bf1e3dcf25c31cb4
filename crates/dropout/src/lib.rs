//! # dropout-rs
//!
//! Training routines for MOOC dropout prediction on a pre-cached feature
//! snapshot, with the estimators they need: a linear SVM, logistic
//! regression, stratified cross-validation, randomized `C` search,
//! recursive feature elimination and probability calibration.
//!
//! Each routine loads the cached training matrix, fits its model, dumps the
//! fitted artifacts back to the cache and writes a submission file of
//! `<enrollment_id>,<probability>` lines. Routines are looked up by name in
//! a [`routines::Registry`].
//!
//! ## Feature Flags
//!
//! - `rayon`: Evaluate folds and search candidates in parallel (off by
//!   default).

pub mod cache;
pub mod calibration;
pub mod cross_validation;
pub mod error;
pub mod estimator;
pub mod io;
pub mod logistic;
pub mod metrics;
pub mod pipeline;
pub mod rfe;
pub mod routines;
pub mod scale;
pub mod search;
pub mod settings;
pub mod submission;
pub mod svc;
pub mod types;

mod util;

/// Log target shared by every record the crate emits.
pub const LOG_TARGET: &str = "modeling";

#[cfg(test)]
mod fixtures;

pub use error::ModelError;
pub use estimator::{
    Coefficients, DecisionFunction, Fit, ProbabilisticClassifier, Regularized, Transform,
};
pub use routines::{Registry, RunContext};
pub use settings::Settings;
pub use types::*;
