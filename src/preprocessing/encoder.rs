//! Label and categorical encoding

use crate::error::{ExperimentError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One-hot encode class indices into an `n_samples × n_classes` matrix
pub fn one_hot(labels: &[usize], n_classes: usize) -> Result<Array2<f64>> {
    if n_classes == 0 {
        return Err(ExperimentError::InvalidInput(
            "one-hot encoding requires at least one class".to_string()
        ));
    }

    let mut encoded = Array2::zeros((labels.len(), n_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label >= n_classes {
            return Err(ExperimentError::InvalidInput(format!(
                "label {} at row {} is out of range for {} classes",
                label, row, n_classes
            )));
        }
        encoded[[row, label]] = 1.0;
    }
    Ok(encoded)
}

/// Column index of the maximum of each row (first one wins on ties)
pub fn argmax_rows(matrix: &Array2<f64>) -> Array1<usize> {
    matrix
        .axis_iter(Axis(0))
        .map(|row| {
            let mut best = 0;
            let mut best_val = f64::NEG_INFINITY;
            for (j, &v) in row.iter().enumerate() {
                if v > best_val {
                    best_val = v;
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// One-hot encoder for a single categorical field. Categories unseen at fit
/// time encode to an all-zero row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryEncoder {
    mapping: BTreeMap<String, usize>,
    is_fitted: bool,
}

impl CategoryEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the category vocabulary (sorted, so column order is stable)
    pub fn fit<'a, I>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut categories: Vec<&str> = values.into_iter().collect();
        categories.sort_unstable();
        categories.dedup();

        self.mapping = categories
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c.to_string(), i))
            .collect();
        self.is_fitted = true;
        self
    }

    pub fn transform<'a, I>(&self, values: I) -> Result<Array2<f64>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.is_fitted {
            return Err(ExperimentError::ModelNotFitted);
        }

        let values: Vec<&str> = values.into_iter().collect();
        let mut encoded = Array2::zeros((values.len(), self.mapping.len()));
        for (row, value) in values.iter().enumerate() {
            if let Some(&col) = self.mapping.get(*value) {
                encoded[[row, col]] = 1.0;
            }
        }
        Ok(encoded)
    }

    pub fn n_categories(&self) -> usize {
        self.mapping.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_one_hot_round_trip() {
        let labels = vec![0, 2, 1, 1, 0];
        let encoded = one_hot(&labels, 3).unwrap();

        assert_eq!(encoded.dim(), (5, 3));
        assert_eq!(encoded.sum(), 5.0);
        assert_eq!(argmax_rows(&encoded).to_vec(), labels);
    }

    #[test]
    fn test_one_hot_out_of_range() {
        assert!(matches!(one_hot(&[0, 3], 2), Err(ExperimentError::InvalidInput(_))));
        assert!(one_hot(&[0], 0).is_err());
    }

    #[test]
    fn test_argmax_ties() {
        let m = array![[0.5, 0.5], [0.1, 0.9]];
        assert_eq!(argmax_rows(&m).to_vec(), vec![0, 1]);
    }

    #[test]
    fn test_category_encoder() {
        let mut encoder = CategoryEncoder::new();
        encoder.fit(["SHELDON", "PENNY", "SHELDON", "LEONARD"]);
        assert_eq!(encoder.n_categories(), 3);

        let encoded = encoder.transform(["PENNY", "HOWARD", "SHELDON"]).unwrap();
        assert_eq!(encoded.dim(), (3, 3));
        // sorted vocabulary: LEONARD, PENNY, SHELDON
        assert_eq!(encoded.row(0).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(encoded.row(1).sum(), 0.0);
        assert_eq!(encoded.row(2).to_vec(), vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_category_encoder_not_fitted() {
        let encoder = CategoryEncoder::new();
        assert!(matches!(encoder.transform(["x"]), Err(ExperimentError::ModelNotFitted)));
    }
}
