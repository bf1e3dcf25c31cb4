//! Scoring helpers for model selection and log output.

use ndarray::ArrayView1;
use ndarray::ArrayView2;

use crate::error::ModelError;
use crate::estimator::ProbabilisticClassifier;
use crate::util::is_positive;

/// Area under the ROC curve of `scores` against binary `labels`.
///
/// Computed from the Mann-Whitney statistic with average ranks for tied
/// scores, so a constant score yields 0.5. Fails when the inputs differ in
/// length, contain a NaN score, or only one class is present.
pub fn roc_auc(labels: ArrayView1<f64>, scores: ArrayView1<f64>) -> Result<f64, ModelError> {
    let n = labels.len();
    if n != scores.len() {
        return Err(ModelError::rows(n, scores.len()));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(ModelError::InvalidInput("NaN in scores".into()));
    }

    let n_pos = labels.iter().filter(|&&y| is_positive(y)).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(ModelError::InvalidInput(
            "only one class present in labels; ROC AUC is not defined".into(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // Sum of 1-based average ranks over positive rows.
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && scores[order[j]] == scores[order[i]] {
            j += 1;
        }
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &k in &order[i..j] {
            if is_positive(labels[k]) {
                rank_sum += avg_rank;
            }
        }
        i = j;
    }

    let n_pos_f = n_pos as f64;
    Ok((rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64))
}

/// AUC of a fitted model's positive-class probabilities on `(x, y)`.
pub fn auc_score<M>(model: &M, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<f64, ModelError>
where
    M: ProbabilisticClassifier + ?Sized,
{
    let proba = model.predict_proba(x)?;
    roc_auc(y, proba.view())
}

/// Compute classification accuracy in `[0, 100]` as percent.
///
/// Labels are compared by class (`> 0` positive), so `{0, 1}` predictions
/// match `{-1, +1}` labels.
pub fn accuracy_percentage(predictions: ArrayView1<f64>, labels: ArrayView1<f64>) -> f64 {
    if predictions.is_empty() || predictions.len() != labels.len() {
        return 0.0;
    }

    let correct = predictions
        .iter()
        .zip(labels.iter())
        .filter(|(&pred, &label)| is_positive(pred) == is_positive(label))
        .count();

    100.0 * correct as f64 / labels.len() as f64
}
