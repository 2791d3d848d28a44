//! Classification report and confusion matrix
//!
//! The persisted layout follows the familiar classification-report
//! dictionary: one entry per class label, `"accuracy"`, and the
//! `"micro avg"`, `"macro avg"` and `"weighted avg"` groups.

use crate::error::{ExperimentError, Result};
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

pub const ACCURACY_KEY: &str = "accuracy";
pub const MICRO_AVG_KEY: &str = "micro avg";
pub const MACRO_AVG_KEY: &str = "macro avg";
pub const WEIGHTED_AVG_KEY: &str = "weighted avg";

/// Precision / recall / F1 / support for one class or one average group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScores {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    #[serde(deserialize_with = "support_count")]
    pub support: usize,
}

/// Support is written as an integer, but some report writers emit it as a
/// float (`10.0`); both load as a count.
fn support_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    use serde::de::Error as _;

    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(D::Error::custom(format!("support must be a non-negative count, got {}", value)))
    }
}

/// Value stored under a report key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEntry {
    Scores(MetricScores),
    Scalar(f64),
}

/// One fold's metrics as persisted: metric group name → entry
pub type FoldResult = BTreeMap<String, ReportEntry>;

/// Look up the F1 score of an average group (or class) in a fold result
pub fn f1_score(result: &FoldResult, fold: usize, key: &str) -> Result<f64> {
    match result.get(key) {
        Some(ReportEntry::Scores(scores)) => Ok(scores.f1_score),
        _ => Err(ExperimentError::MissingMetric {
            fold,
            key: key.to_string(),
        }),
    }
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

fn f1(precision: f64, recall: f64) -> f64 {
    safe_div(2.0 * precision * recall, precision + recall)
}

/// Per-class and averaged classification metrics
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Sorted labels present in either y_true or y_pred
    pub labels: Vec<usize>,
    pub per_class: Vec<MetricScores>,
    pub accuracy: f64,
    pub micro_avg: MetricScores,
    pub macro_avg: MetricScores,
    pub weighted_avg: MetricScores,
}

impl ClassificationReport {
    /// Compute the report; zero-division cases score 0.0
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ExperimentError::row_mismatch("predictions", y_true.len(), y_pred.len()));
        }
        if y_true.is_empty() {
            return Err(ExperimentError::InvalidInput(
                "cannot build a classification report from zero samples".to_string()
            ));
        }

        let labels = union_labels(y_true, y_pred);
        let confusion = confusion_matrix(y_true, y_pred, &labels);
        let total = y_true.len();

        let mut per_class = Vec::with_capacity(labels.len());
        let (mut tp_sum, mut pred_sum, mut true_sum) = (0usize, 0usize, 0usize);

        for k in 0..labels.len() {
            let tp = confusion[[k, k]];
            let predicted = confusion.column(k).sum();
            let support = confusion.row(k).sum();

            let precision = safe_div(tp as f64, predicted as f64);
            let recall = safe_div(tp as f64, support as f64);

            per_class.push(MetricScores {
                precision,
                recall,
                f1_score: f1(precision, recall),
                support,
            });

            tp_sum += tp;
            pred_sum += predicted;
            true_sum += support;
        }

        let n_labels = per_class.len() as f64;
        let macro_avg = MetricScores {
            precision: per_class.iter().map(|m| m.precision).sum::<f64>() / n_labels,
            recall: per_class.iter().map(|m| m.recall).sum::<f64>() / n_labels,
            f1_score: per_class.iter().map(|m| m.f1_score).sum::<f64>() / n_labels,
            support: total,
        };

        let weighted = |f: fn(&MetricScores) -> f64| {
            safe_div(
                per_class.iter().map(|m| f(m) * m.support as f64).sum::<f64>(),
                total as f64,
            )
        };
        let weighted_avg = MetricScores {
            precision: weighted(|m: &MetricScores| m.precision),
            recall: weighted(|m: &MetricScores| m.recall),
            f1_score: weighted(|m: &MetricScores| m.f1_score),
            support: total,
        };

        let micro_precision = safe_div(tp_sum as f64, pred_sum as f64);
        let micro_recall = safe_div(tp_sum as f64, true_sum as f64);
        let micro_avg = MetricScores {
            precision: micro_precision,
            recall: micro_recall,
            f1_score: f1(micro_precision, micro_recall),
            support: total,
        };

        Ok(Self {
            labels,
            per_class,
            accuracy: tp_sum as f64 / total as f64,
            micro_avg,
            macro_avg,
            weighted_avg,
        })
    }

    /// Dictionary form used for persistence
    pub fn to_fold_result(&self) -> FoldResult {
        let mut result = FoldResult::new();
        for (label, scores) in self.labels.iter().zip(self.per_class.iter()) {
            result.insert(label.to_string(), ReportEntry::Scores(scores.clone()));
        }
        result.insert(ACCURACY_KEY.to_string(), ReportEntry::Scalar(self.accuracy));
        result.insert(MICRO_AVG_KEY.to_string(), ReportEntry::Scores(self.micro_avg.clone()));
        result.insert(MACRO_AVG_KEY.to_string(), ReportEntry::Scores(self.macro_avg.clone()));
        result.insert(WEIGHTED_AVG_KEY.to_string(), ReportEntry::Scores(self.weighted_avg.clone()));
        result
    }

    /// Human-readable table
    pub fn render(&self) -> String {
        let name_width = self
            .labels
            .iter()
            .map(|l| l.to_string().len())
            .chain(std::iter::once(WEIGHTED_AVG_KEY.len()))
            .max()
            .unwrap_or(WEIGHTED_AVG_KEY.len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>w$} {:>9} {:>9} {:>9} {:>9}\n",
            "", "precision", "recall", "f1-score", "support",
            w = name_width
        );

        let row = |out: &mut String, name: &str, m: &MetricScores| {
            let _ = writeln!(
                out,
                "{:>w$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, m.precision, m.recall, m.f1_score, m.support,
                w = name_width
            );
        };

        for (label, m) in self.labels.iter().zip(self.per_class.iter()) {
            row(&mut out, &label.to_string(), m);
        }
        out.push('\n');

        let total = self.macro_avg.support;
        let _ = writeln!(
            out,
            "{:>w$} {:>9} {:>9} {:>9.2} {:>9}",
            ACCURACY_KEY, "", "", self.accuracy, total,
            w = name_width
        );
        row(&mut out, MICRO_AVG_KEY, &self.micro_avg);
        row(&mut out, MACRO_AVG_KEY, &self.macro_avg);
        row(&mut out, WEIGHTED_AVG_KEY, &self.weighted_avg);
        out
    }
}

fn union_labels(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    let mut labels: Vec<usize> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    labels
}

/// Confusion matrix over `labels`: rows are true labels, columns predictions.
/// Samples whose labels are not listed are ignored.
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], labels: &[usize]) -> Array2<usize> {
    let position: BTreeMap<usize, usize> = labels.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    let mut matrix = Array2::zeros((labels.len(), labels.len()));

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        if let (Some(&i), Some(&j)) = (position.get(t), position.get(p)) {
            matrix[[i, j]] += 1;
        }
    }
    matrix
}

/// Render a confusion matrix as bracketed rows
pub fn render_confusion(matrix: &Array2<usize>) -> String {
    let width = matrix.iter().map(|v| v.to_string().len()).max().unwrap_or(1);
    matrix
        .outer_iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{:>w$}", v, w = width)).collect();
            format!("[{}]", cells.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 0, 1, 1];
        let report = ClassificationReport::compute(&y, &y).unwrap();
        assert_eq!(report.labels, vec![0, 1]);
        assert!((report.accuracy - 1.0).abs() < 1e-12);
        assert!((report.macro_avg.f1_score - 1.0).abs() < 1e-12);
        assert!((report.weighted_avg.f1_score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_binary_report_values() {
        // class 0: tp=2 fp=1 fn=1; class 1: tp=3 fp=1 fn=1
        let y_true = vec![0, 0, 0, 1, 1, 1, 1];
        let y_pred = vec![0, 0, 1, 1, 1, 1, 0];
        let report = ClassificationReport::compute(&y_true, &y_pred).unwrap();

        let c0 = &report.per_class[0];
        assert!((c0.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((c0.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(c0.support, 3);

        let c1 = &report.per_class[1];
        assert!((c1.precision - 0.75).abs() < 1e-12);
        assert!((c1.recall - 0.75).abs() < 1e-12);
        assert_eq!(c1.support, 4);

        assert!((report.accuracy - 5.0 / 7.0).abs() < 1e-12);
        assert!((report.micro_avg.f1_score - report.accuracy).abs() < 1e-12);
        assert!((report.macro_avg.f1_score - (2.0 / 3.0 + 0.75) / 2.0).abs() < 1e-12);
        let weighted = (3.0 * 2.0 / 3.0 + 4.0 * 0.75) / 7.0;
        assert!((report.weighted_avg.f1_score - weighted).abs() < 1e-12);
    }

    #[test]
    fn test_zero_division_scores_zero() {
        // class 1 never predicted
        let report = ClassificationReport::compute(&[0, 1], &[0, 0]).unwrap();
        assert_eq!(report.per_class[1].precision, 0.0);
        assert_eq!(report.per_class[1].f1_score, 0.0);
    }

    #[test]
    fn test_fold_result_keys() {
        let report = ClassificationReport::compute(&[0, 1, 1], &[0, 1, 0]).unwrap();
        let result = report.to_fold_result();
        let keys: Vec<&str> = result.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["0", "1", "accuracy", "macro avg", "micro avg", "weighted avg"]);
        assert!(matches!(result["accuracy"], ReportEntry::Scalar(_)));
    }

    #[test]
    fn test_fold_result_json_layout() {
        let report = ClassificationReport::compute(&[0, 1], &[0, 1]).unwrap();
        let json = serde_json::to_value(report.to_fold_result()).unwrap();
        assert_eq!(json["macro avg"]["f1-score"], serde_json::json!(1.0));
        assert_eq!(json["0"]["support"], serde_json::json!(1));
        assert_eq!(json["accuracy"], serde_json::json!(1.0));

        let back: FoldResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, report.to_fold_result());
    }

    #[test]
    fn test_f1_lookup_missing() {
        let result = FoldResult::new();
        assert!(matches!(
            f1_score(&result, 1, MICRO_AVG_KEY),
            Err(ExperimentError::MissingMetric { fold: 1, .. })
        ));
    }

    #[test]
    fn test_confusion_matrix() {
        let m = confusion_matrix(&[0, 0, 1, 1], &[0, 1, 1, 1], &[0, 1]);
        assert_eq!(m[[0, 0]], 1);
        assert_eq!(m[[0, 1]], 1);
        assert_eq!(m[[1, 1]], 2);
        assert_eq!(render_confusion(&m), "[1 1]\n[0 2]");
    }

    #[test]
    fn test_render_contains_groups() {
        let report = ClassificationReport::compute(&[0, 1, 1], &[0, 1, 0]).unwrap();
        let text = report.render();
        for key in ["precision", "accuracy", "micro avg", "macro avg", "weighted avg"] {
            assert!(text.contains(key), "missing {} in\n{}", key, text);
        }
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            ClassificationReport::compute(&[0, 1], &[0]),
            Err(ExperimentError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_float_support_loads() {
        let raw = r#"{
            "0": {"precision": 0.5, "recall": 1.0, "f1-score": 0.6667, "support": 2.0},
            "accuracy": 0.75,
            "macro avg": {"precision": 0.75, "recall": 0.8, "f1-score": 0.73, "support": 4.0},
            "weighted avg": {"precision": 0.8, "recall": 0.75, "f1-score": 0.74, "support": 4}
        }"#;
        let result: FoldResult = serde_json::from_str(raw).unwrap();

        match &result["0"] {
            ReportEntry::Scores(scores) => assert_eq!(scores.support, 2),
            other => panic!("unexpected entry: {:?}", other),
        }
        assert_eq!(result[ACCURACY_KEY], ReportEntry::Scalar(0.75));
        assert_eq!(f1_score(&result, 1, MACRO_AVG_KEY).unwrap(), 0.73);
    }

    #[test]
    fn test_fractional_support_rejected() {
        let raw = r#"{"precision": 1.0, "recall": 1.0, "f1-score": 1.0, "support": 2.5}"#;
        assert!(serde_json::from_str::<MetricScores>(raw).is_err());
    }
}
