//! Stratified k-fold splitting

use crate::error::{ExperimentError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter: every fold keeps the class proportions of
/// the whole label array as closely as possible.
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: true,
            random_state: None,
        }
    }

    /// Shuffle within each class before dealing samples to folds
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn check_sizes(n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 {
            return Err(ExperimentError::ValidationError(
                "n_splits must be at least 2".to_string()
            ));
        }
        if n_samples < n_splits {
            return Err(ExperimentError::ValidationError(
                format!("n_samples ({}) must be >= n_splits ({})", n_samples, n_splits)
            ));
        }
        Ok(())
    }

    /// Generate train/test index pairs for class indices `y`
    pub fn split(&self, y: &[usize]) -> Result<Vec<CVSplit>> {
        let n_splits = self.n_splits;
        Self::check_sizes(y.len(), n_splits)?;

        // Ordered by class so splits are reproducible for a fixed seed
        let mut class_indices: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, &class) in y.iter().enumerate() {
            class_indices.entry(class).or_default().push(idx);
        }

        for (class, indices) in &class_indices {
            if indices.len() < n_splits {
                tracing::warn!(
                    class = *class,
                    members = indices.len(),
                    n_splits,
                    "Least populated class has fewer members than n_splits"
                );
            }
        }

        if self.shuffle {
            let mut rng = self.rng();
            for indices in class_indices.values_mut() {
                indices.shuffle(&mut rng);
            }
        }

        // Deal samples round-robin, continuing the fold cursor across classes
        // so fold sizes stay balanced.
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        let mut cursor = 0;
        for indices in class_indices.values() {
            for &idx in indices {
                folds[cursor % n_splits].push(idx);
                cursor += 1;
            }
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();

                CVSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

/// Aggregate of a per-fold score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores. An empty list yields NaN statistics.
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;
        let std_score = variance.sqrt();

        Self {
            scores,
            mean_score,
            std_score,
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stratified_k_fold() {
        let y = vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1];

        let splits = StratifiedKFold::new(5).with_shuffle(false).split(&y).unwrap();
        assert_eq!(splits.len(), 5);

        // Each fold should have 1 sample from each class
        for split in &splits {
            assert_eq!(split.test_indices.len(), 2);
            let positives = split.test_indices.iter().filter(|&&i| y[i] == 1).count();
            assert_eq!(positives, 1);
        }

        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_k_fold_is_seeded() {
        let y: Vec<usize> = (0..40).map(|i| i % 2).collect();
        let a = StratifiedKFold::new(4).with_random_state(7).split(&y).unwrap();
        let b = StratifiedKFold::new(4).with_random_state(7).split(&y).unwrap();

        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
            assert_eq!(sa.train_indices.len() + sa.test_indices.len(), 40);
            for idx in &sa.test_indices {
                assert!(!sa.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_invalid_fold_counts() {
        let y = vec![0, 1, 0, 1];
        assert!(matches!(
            StratifiedKFold::new(1).split(&y),
            Err(ExperimentError::ValidationError(_))
        ));
        assert!(matches!(
            StratifiedKFold::new(5).split(&y),
            Err(ExperimentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_cv_results_mean() {
        let results = CVResults::from_scores(vec![0.5, 0.7, 0.9]);
        assert_eq!(results.n_folds, 3);
        assert!((results.mean_score - 0.7).abs() < 1e-12);
        assert!(results.std_score > 0.0);
    }
}
