//! Support Vector Machine classifier
//!
//! Kernel SVM trained with SMO (Sequential Minimal Optimization). Two-class
//! problems use a single binary machine; more classes use One-vs-Rest.

use crate::error::{ExperimentError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training will return an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Below this many samples the kernel matrix is filled sequentially.
const PARALLEL_KERNEL_THRESHOLD: usize = 100;

/// Kernel coefficient
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * X.var())`
    #[default]
    Scale,
    /// `1 / n_features`
    Auto,
    /// Fixed value
    Value(f64),
}

impl Gamma {
    /// Resolve the coefficient for a training matrix
    pub fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self {
            Gamma::Scale => {
                let var = x.var(0.0);
                if var > 0.0 && var.is_finite() {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
            Gamma::Auto => 1.0 / n_features,
            Gamma::Value(g) => *g,
        }
    }
}

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Polynomial kernel: K(x, y) = (γ * x · y + r)^d
    Polynomial { degree: usize, coef0: f64 },
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    RBF,
    /// Sigmoid kernel: K(x, y) = tanh(γ * x · y + r)
    Sigmoid { coef0: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::RBF
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Kernel coefficient for RBF, polynomial and sigmoid kernels
    pub gamma: Gamma,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 10.0,
            kernel: KernelType::RBF,
            gamma: Gamma::Scale,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

/// Resolved kernel with a concrete gamma
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Kernel {
    kind: KernelType,
    gamma: f64,
}

impl Kernel {
    fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match &self.kind {
            KernelType::Linear => a.dot(&b),
            KernelType::Polynomial { degree, coef0 } => {
                (self.gamma * a.dot(&b) + coef0).powi((*degree).min(i32::MAX as usize) as i32)
            }
            KernelType::RBF => {
                let norm_sq: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum();
                (-self.gamma * norm_sq).exp()
            }
            KernelType::Sigmoid { coef0 } => (self.gamma * a.dot(&b) + coef0).tanh(),
        }
    }

    /// Compute the symmetric Gram matrix (parallel for larger inputs)
    fn matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));

        if n < PARALLEL_KERNEL_THRESHOLD {
            for i in 0..n {
                for j in i..n {
                    let val = self.eval(x.row(i), x.row(j));
                    k[[i, j]] = val;
                    k[[j, i]] = val;
                }
            }
            return k;
        }

        let rows: Vec<Vec<(usize, f64)>> = (0..n)
            .into_par_iter()
            .map(|i| (i..n).map(|j| (j, self.eval(x.row(i), x.row(j)))).collect())
            .collect();

        for (i, row_vals) in rows.into_iter().enumerate() {
            for (j, val) in row_vals {
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }
}

/// A single binary SVM (positive class vs the rest)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

impl BinarySVM {
    fn score(&self, kernel: &Kernel, sample: ArrayView1<f64>) -> f64 {
        let mut sum = self.bias;
        for (j, sv) in self.support_vectors.outer_iter().enumerate() {
            sum += self.alphas[j] * self.support_labels[j] * kernel.eval(sample, sv);
        }
        sum
    }
}

/// Support Vector Classifier over integer class indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    kernel: Option<Kernel>,
    /// Sorted distinct class indices seen during fit
    classes: Vec<usize>,
    /// One machine for two classes (positive = classes[1]), one per class otherwise
    machines: Vec<BinarySVM>,
    n_features: usize,
}

impl SVMClassifier {
    /// Create a new SVM classifier
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            kernel: None,
            classes: Vec::new(),
            machines: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit the classifier on class indices
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ExperimentError::row_mismatch("labels", x.nrows(), y.len()));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ExperimentError::InvalidInput(
                "SVM input contains NaN or infinite values".to_string(),
            ));
        }
        if self.config.c <= 0.0 {
            return Err(ExperimentError::InvalidInput(format!(
                "SVM regularization C must be positive, got {}",
                self.config.c
            )));
        }

        let mut classes: Vec<usize> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        if classes.len() < 2 {
            return Err(ExperimentError::InvalidInput(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        let kernel = Kernel {
            kind: self.config.kernel.clone(),
            gamma: self.config.gamma.resolve(x),
        };
        tracing::debug!(
            samples = x.nrows(),
            features = x.ncols(),
            classes = classes.len(),
            gamma = kernel.gamma,
            "Fitting SVM"
        );

        if x.nrows() > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(ExperimentError::InvalidInput(format!(
                "Dataset has {} samples, exceeding the maximum {} for SVM kernel matrix. \
                 Consider subsampling.",
                x.nrows(),
                MAX_KERNEL_MATRIX_SAMPLES
            )));
        }
        let kernel_matrix = kernel.matrix(x);

        let positives: Vec<usize> = if classes.len() == 2 {
            vec![classes[1]]
        } else {
            classes.clone()
        };

        let mut machines = Vec::with_capacity(positives.len());
        for &cls in &positives {
            let y_binary: Array1<f64> = y.mapv(|v| if v == cls { 1.0 } else { -1.0 });
            machines.push(self.fit_binary(x, &y_binary, &kernel_matrix));
        }

        self.classes = classes;
        self.machines = machines;
        self.kernel = Some(kernel);
        self.n_features = x.ncols();
        Ok(())
    }

    fn fit_binary(&self, x: &Array2<f64>, y: &Array1<f64>, k: &Array2<f64>) -> BinarySVM {
        let (alphas, bias) = self.smo_train(y, k);

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        let sv_count = support_indices.len();
        let mut support_vectors = Array2::zeros((sv_count, x.ncols()));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);

        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y[idx];
            support_alphas[i] = alphas[idx];
        }

        BinarySVM {
            support_vectors,
            alphas: support_alphas,
            support_labels,
            bias,
        }
    }

    /// SMO training over a precomputed kernel matrix
    fn smo_train(&self, y: &Array1<f64>, k: &Array2<f64>) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;

        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        if n <= 1 {
            return (alphas, bias);
        }

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = decision_cached(k, &alphas, y, bias, i) - y[i];

                // KKT violation
                if (y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0) {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision_cached(k, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        ((alphas[j] - alphas[i]).max(0.0), (c + alphas[j] - alphas[i]).min(c))
                    } else {
                        ((alphas[i] + alphas[j] - c).max(0.0), (alphas[i] + alphas[j]).min(c))
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);

                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * k[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * k[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * k[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * k[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        (alphas, bias)
    }

    fn fitted_kernel(&self, x: ArrayView2<f64>) -> Result<&Kernel> {
        let kernel = self.kernel.as_ref().ok_or(ExperimentError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ExperimentError::ShapeError {
                expected: format!("{} feature columns", self.n_features),
                actual: format!("{} feature columns", x.ncols()),
            });
        }
        Ok(kernel)
    }

    /// Predict class indices
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let kernel = self.fitted_kernel(x.view())?;

        let predictions: Vec<usize> = x
            .outer_iter()
            .map(|sample| {
                if self.machines.len() == 1 {
                    if self.machines[0].score(kernel, sample) >= 0.0 {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                } else {
                    let mut best_score = f64::NEG_INFINITY;
                    let mut best_class = self.classes[0];
                    for (k, machine) in self.machines.iter().enumerate() {
                        let score = machine.score(kernel, sample);
                        if score > best_score {
                            best_score = score;
                            best_class = self.classes[k];
                        }
                    }
                    best_class
                }
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Decision values: one column for two classes, one per class otherwise
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let kernel = self.fitted_kernel(x.view())?;

        let mut scores = Array2::zeros((x.nrows(), self.machines.len()));
        for (i, sample) in x.outer_iter().enumerate() {
            for (k, machine) in self.machines.iter().enumerate() {
                scores[[i, k]] = machine.score(kernel, sample);
            }
        }
        Ok(scores)
    }

    /// Class indices seen during fit
    pub fn classes(&self) -> &[usize] {
        &self.classes
    }

    /// Kernel coefficient resolved at fit time
    pub fn gamma(&self) -> Option<f64> {
        self.kernel.as_ref().map(|k| k.gamma)
    }

    /// Total number of support vectors across all machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.nrows()).sum()
    }

    pub fn is_fitted(&self) -> bool {
        self.kernel.is_some()
    }
}

fn decision_cached(k: &Array2<f64>, alphas: &Array1<f64>, y: &Array1<f64>, bias: f64, idx: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..alphas.len() {
        if alphas[i] != 0.0 {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
    }
    sum + bias
}
