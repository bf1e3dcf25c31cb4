//! Fitted transformation chains ending in a probabilistic classifier.

use ndarray::{Array1, Array2, ArrayView2, CowArray, Ix2};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibratedModel;
use crate::error::ModelError;
use crate::estimator::{ProbabilisticClassifier, Transform};
use crate::logistic::LogisticModel;
use crate::rfe::FeatureSelection;
use crate::scale::StandardScaler;
use crate::svc::LinearSvcModel;

/// A fitted column transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    Standardize(StandardScaler),
    SelectFeatures(FeatureSelection),
}

impl Transform for Step {
    fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        match self {
            Step::Standardize(scaler) => scaler.transform(x),
            Step::SelectFeatures(selection) => selection.transform(x),
        }
    }
}

/// The final estimator of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Classifier {
    Logistic(LogisticModel),
    CalibratedSvc(CalibratedModel<LinearSvcModel>),
}

impl ProbabilisticClassifier for Classifier {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        match self {
            Classifier::Logistic(model) => model.predict_proba(x),
            Classifier::CalibratedSvc(model) => model.predict_proba(x),
        }
    }
}

/// Named steps applied in order, then the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<(String, Step)>,
    pub classifier: Classifier,
}

impl Pipeline {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            steps: Vec::new(),
            classifier,
        }
    }

    /// Append a step; builder style.
    pub fn then(mut self, name: impl Into<String>, step: Step) -> Self {
        self.steps.push((name.into(), step));
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run `x` through every step.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        let mut current: CowArray<f64, Ix2> = CowArray::from(x);
        for (_, step) in &self.steps {
            current = CowArray::from(step.transform(current.view())?);
        }
        Ok(current.into_owned())
    }
}

impl ProbabilisticClassifier for Pipeline {
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        let transformed = self.transform(x)?;
        self.classifier.predict_proba(transformed.view())
    }
}
