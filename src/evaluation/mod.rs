//! Held-out evaluation of a fitted classifier

pub mod report;

pub use report::{
    confusion_matrix, f1_score, render_confusion, ClassificationReport, FoldResult, MetricScores,
    ReportEntry, ACCURACY_KEY, MACRO_AVG_KEY, MICRO_AVG_KEY, WEIGHTED_AVG_KEY,
};

use crate::error::{ExperimentError, Result};
use crate::preprocessing::argmax_rows;
use crate::training::SVMClassifier;
use ndarray::Array2;

/// Outcome of scoring one held-out fold
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub report_text: String,
    /// Rows are true labels, columns predictions, both over `report.labels`
    pub confusion: Array2<usize>,
}

/// Predict on held-out features and score against one-hot labels
pub fn svm_test(
    classifier: &SVMClassifier,
    features: &Array2<f64>,
    one_hot_labels: &Array2<f64>,
) -> Result<Evaluation> {
    if features.nrows() != one_hot_labels.nrows() {
        return Err(ExperimentError::row_mismatch(
            "test labels",
            features.nrows(),
            one_hot_labels.nrows(),
        ));
    }

    let y_pred = classifier.predict(features)?.to_vec();
    let y_true = argmax_rows(one_hot_labels).to_vec();

    let report = ClassificationReport::compute(&y_true, &y_pred)?;
    let confusion = confusion_matrix(&y_true, &y_pred, &report.labels);
    let report_text = report.render();

    Ok(Evaluation {
        report,
        report_text,
        confusion,
    })
}
