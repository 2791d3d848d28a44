//! Model training
//!
//! Provides the kernel SVM classifier, cross-validation splitters and the
//! fold-level trainer that fits an SVM on one-hot encoded labels.

pub mod cross_validation;
pub mod svm;

pub use cross_validation::{CVResults, CVSplit, StratifiedKFold};
pub use svm::{Gamma, KernelType, SVMClassifier, SVMConfig};

use crate::error::{ExperimentError, Result};
use crate::preprocessing::argmax_rows;
use ndarray::Array2;

/// Fit an SVM on features and one-hot labels (class = arg-max of each row)
pub fn svm_train(
    features: &Array2<f64>,
    one_hot_labels: &Array2<f64>,
    config: &SVMConfig,
) -> Result<SVMClassifier> {
    if features.nrows() != one_hot_labels.nrows() {
        return Err(ExperimentError::row_mismatch(
            "train labels",
            features.nrows(),
            one_hot_labels.nrows(),
        ));
    }

    let y = argmax_rows(one_hot_labels);
    let mut classifier = SVMClassifier::new(config.clone());
    classifier.fit(features, &y)?;
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::one_hot;

    #[test]
    fn test_svm_train_uses_argmax_labels() {
        let x = Array2::from_shape_vec((6, 1), vec![0.0, 0.2, 0.4, 4.0, 4.2, 4.4]).unwrap();
        let y = one_hot(&[1, 1, 1, 2, 2, 2], 3).unwrap();

        let clf = svm_train(&x, &y, &SVMConfig::default()).unwrap();
        assert_eq!(clf.classes(), &[1, 2]);
        assert!(clf.gamma().is_some());
    }

    #[test]
    fn test_svm_train_row_mismatch() {
        let x = Array2::<f64>::zeros((5, 2));
        let y = one_hot(&[0, 1], 2).unwrap();
        let err = svm_train(&x, &y, &SVMConfig::default()).unwrap_err();
        assert!(matches!(err, ExperimentError::ShapeError { .. }));
    }
}
