//! Support vector machine classifier
//!
//! SMO (sequential minimal optimization) over a precomputed kernel matrix,
//! one-vs-rest for more than two classes.

use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{check_fit_shapes, unique_classes, Classifier, FeatureScaler};
use crate::error::{BenchError, Result};

/// Maximum rows for the eager kernel matrix; beyond this fit refuses
/// rather than risk an OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// K(x, y) = x . y
    Linear,
    /// K(x, y) = (gamma * x . y + coef0)^degree
    Polynomial { degree: usize, gamma: f64, coef0: f64 },
    /// K(x, y) = exp(-gamma * ||x - y||^2)
    RBF { gamma: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Linear
    }
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for the KKT check
    pub tol: f64,
    /// Maximum number of optimization sweeps
    pub max_iter: usize,
    /// Seed for the working-pair draws
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Linear,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

/// One binary machine of the one-vs-rest ensemble
#[derive(Debug, Clone)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

/// Support vector classifier.
///
/// Features are standardized internally before the kernel matrix is built,
/// so widely scaled inputs do not stall the optimizer. Two classes train a
/// single machine; more train one machine per class and predict by the
/// highest decision score.
#[derive(Debug, Clone)]
pub struct SVMClassifier {
    config: SVMConfig,
    machines: Vec<BinarySVM>,
    classes: Vec<i64>,
    scaler: Option<FeatureScaler>,
}

impl Default for SVMClassifier {
    fn default() -> Self {
        Self::new(SVMConfig::default())
    }
}

impl SVMClassifier {
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            machines: Vec::new(),
            classes: Vec::new(),
            scaler: None,
        }
    }

    /// Support vector count per trained machine
    pub fn n_support(&self) -> Vec<usize> {
        self.machines
            .iter()
            .map(|m| m.support_vectors.nrows())
            .collect()
    }

    /// Raw decision scores, one column per machine
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let scaler = self.scaler.as_ref().ok_or(BenchError::NotFitted)?;
        if self.machines.is_empty() {
            return Err(BenchError::NotFitted);
        }

        let scaled = scaler.transform(x);
        let mut scores = Array2::zeros((scaled.nrows(), self.machines.len()));
        for (i, sample) in scaled.rows().into_iter().enumerate() {
            for (k, machine) in self.machines.iter().enumerate() {
                scores[[i, k]] = self.score_sample(sample, machine);
            }
        }
        Ok(scores)
    }

    fn train_machine(
        &self,
        x: &Array2<f64>,
        kernel_matrix: &Array2<f64>,
        y_binary: &Array1<f64>,
    ) -> BinarySVM {
        let (alphas, bias, support_indices) = self.smo_train(kernel_matrix, y_binary);

        let mut support_vectors = Array2::zeros((support_indices.len(), x.ncols()));
        let mut support_labels = Array1::zeros(support_indices.len());
        let mut support_alphas = Array1::zeros(support_indices.len());
        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y_binary[idx];
            support_alphas[i] = alphas[idx];
        }

        BinarySVM {
            support_vectors,
            alphas: support_alphas,
            support_labels,
            bias,
        }
    }

    /// Simplified SMO sweep: pick a KKT violator i, pair it with a random j,
    /// and solve the two-variable subproblem analytically.
    fn smo_train(
        &self,
        kernel_matrix: &Array2<f64>,
        y: &Array1<f64>,
    ) -> (Array1<f64>, f64, Vec<usize>) {
        let n = y.len();
        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i = cached_decision(kernel_matrix, &alphas, y, bias, i) - y[i];

                // KKT violation check
                if (y[i] * e_i < -self.config.tol && alphas[i] < self.config.c)
                    || (y[i] * e_i > self.config.tol && alphas[i] > 0.0)
                {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = cached_decision(kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (self.config.c + alphas[j] - alphas[i]).min(self.config.c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - self.config.c).max(0.0),
                            (alphas[i] + alphas[j]).min(self.config.c),
                        )
                    };
                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * kernel_matrix[[i, j]]
                        - kernel_matrix[[i, i]]
                        - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] -= y[j] * (e_i - e_j) / eta;
                    alphas[j] = alphas[j].max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < self.config.c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < self.config.c {
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

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        (alphas, bias, support_indices)
    }

    /// Symmetric kernel matrix; upper-triangle rows computed in parallel
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| (i..n).map(|j| self.kernel(x.row(i), x.row(j))).collect())
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row_vals) in rows.into_iter().enumerate() {
            for (offset, val) in row_vals.into_iter().enumerate() {
                let j = i + offset;
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match &self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::Polynomial {
                degree,
                gamma,
                coef0,
            } => (*gamma * a.dot(&b) + coef0).powi((*degree).min(i32::MAX as usize) as i32),
            KernelType::RBF { gamma } => {
                let mut norm_sq = 0.0;
                for (ai, bi) in a.iter().zip(b.iter()) {
                    let d = ai - bi;
                    norm_sq += d * d;
                }
                (-gamma * norm_sq).exp()
            }
        }
    }

    fn score_sample(&self, sample: ArrayView1<f64>, machine: &BinarySVM) -> f64 {
        let mut sum = machine.bias;
        for j in 0..machine.support_vectors.nrows() {
            let k_val = self.kernel(sample, machine.support_vectors.row(j));
            sum += machine.alphas[j] * machine.support_labels[j] * k_val;
        }
        sum
    }
}

impl Classifier for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        // Class labels must be integral: silently truncating 1.5 to a class
        // key would misgroup samples.
        for (i, &v) in y.iter().enumerate() {
            if (v - v.round()).abs() > 1e-9 {
                return Err(BenchError::fit(
                    "svm",
                    format!("sample {} has non-integer class label {}", i, v),
                ));
            }
        }

        let classes = unique_classes(y);
        if classes.len() < 2 {
            return Err(BenchError::fit(
                "svm",
                "requires at least 2 distinct classes",
            ));
        }
        if x.nrows() > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(BenchError::fit(
                "svm",
                format!(
                    "{} rows exceed the {} supported by the eager kernel matrix",
                    x.nrows(),
                    MAX_KERNEL_MATRIX_SAMPLES
                ),
            ));
        }

        let scaler = FeatureScaler::fit(x);
        let scaled = scaler.transform(x);
        let kernel_matrix = self.compute_kernel_matrix(&scaled);

        let machines = if classes.len() == 2 {
            // Single machine; positive side is the larger class key
            let positive = classes[1];
            let y_binary = y.mapv(|v| if v.round() as i64 == positive { 1.0 } else { -1.0 });
            vec![self.train_machine(&scaled, &kernel_matrix, &y_binary)]
        } else {
            classes
                .iter()
                .map(|&cls| {
                    let y_binary =
                        y.mapv(|v| if v.round() as i64 == cls { 1.0 } else { -1.0 });
                    self.train_machine(&scaled, &kernel_matrix, &y_binary)
                })
                .collect()
        };

        self.classes = classes;
        self.machines = machines;
        self.scaler = Some(scaler);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaler = self.scaler.as_ref().ok_or(BenchError::NotFitted)?;
        if self.machines.is_empty() {
            return Err(BenchError::NotFitted);
        }

        let scaled = scaler.transform(x);
        let mut predictions = Array1::zeros(scaled.nrows());

        if self.classes.len() == 2 {
            let machine = &self.machines[0];
            for (i, sample) in scaled.rows().into_iter().enumerate() {
                let score = self.score_sample(sample, machine);
                predictions[i] = if score >= 0.0 {
                    self.classes[1] as f64
                } else {
                    self.classes[0] as f64
                };
            }
        } else {
            for (i, sample) in scaled.rows().into_iter().enumerate() {
                let mut best_class = self.classes[0];
                let mut best_score = f64::NEG_INFINITY;
                for (k, machine) in self.machines.iter().enumerate() {
                    let score = self.score_sample(sample, machine);
                    if score > best_score {
                        best_score = score;
                        best_class = self.classes[k];
                    }
                }
                predictions[i] = best_class as f64;
            }
        }

        Ok(predictions)
    }
}

/// Decision value for training row `idx` from the cached kernel matrix
fn cached_decision(
    k: &Array2<f64>,
    alphas: &Array1<f64>,
    y: &Array1<f64>,
    bias: f64,
    idx: usize,
) -> f64 {
    let mut sum = 0.0;
    for i in 0..alphas.len() {
        sum += alphas[i] * y[i] * k[[i, idx]];
    }
    sum + bias
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn binary_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 1.0],
            [1.5, 1.5],
            [2.0, 1.0],
            [1.0, 2.0],
            [7.0, 7.0],
            [7.5, 7.5],
            [8.0, 7.0],
            [7.0, 8.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_binary_linear() {
        let (x, y) = binary_data();

        let mut svm = SVMClassifier::default();
        svm.fit(&x, &y).unwrap();

        assert!(!svm.n_support().is_empty());
        let predictions = svm.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_multiclass_ovr() {
        let x = array![
            [1.0, 1.0],
            [1.4, 1.2],
            [1.2, 1.4],
            [6.0, 1.0],
            [6.4, 1.2],
            [6.2, 1.4],
            [3.5, 7.0],
            [3.9, 7.2],
            [3.7, 7.4],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

        let mut svm = SVMClassifier::default();
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.n_support().len(), 3);
        let predictions = svm.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_rbf_on_nonlinear_data() {
        // Center cluster vs surrounding ring: not linearly separable.
        let x = array![
            [0.1, 0.1],
            [-0.1, 0.1],
            [0.1, -0.1],
            [-0.1, -0.1],
            [0.2, 0.0],
            [0.0, 0.2],
            [-0.2, 0.0],
            [0.0, -0.2],
            [3.0, 0.0],
            [0.0, 3.0],
            [-3.0, 0.0],
            [0.0, -3.0],
            [2.1, 2.1],
            [-2.1, 2.1],
            [2.1, -2.1],
            [-2.1, -2.1],
        ];
        let y = array![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0
        ];

        let mut svm = SVMClassifier::new(SVMConfig {
            kernel: KernelType::RBF { gamma: 1.0 },
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        let predictions = svm.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        assert!(correct >= 15, "RBF should separate ring data, got {}/16", correct);
    }

    #[test]
    fn test_kernels() {
        let svm = SVMClassifier::default();
        let a = array![1.0, 2.0];
        let b = array![3.0, 4.0];
        assert!((svm.kernel(a.view(), b.view()) - 11.0).abs() < 1e-12);

        let poly = SVMClassifier::new(SVMConfig {
            kernel: KernelType::Polynomial {
                degree: 2,
                gamma: 1.0,
                coef0: 1.0,
            },
            ..Default::default()
        });
        assert!((poly.kernel(a.view(), b.view()) - 144.0).abs() < 1e-12);

        let rbf = SVMClassifier::new(SVMConfig {
            kernel: KernelType::RBF { gamma: 0.5 },
            ..Default::default()
        });
        let expected = (-0.5f64 * 8.0).exp();
        assert!((rbf.kernel(a.view(), b.view()) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_seeded_training_is_reproducible() {
        let (x, y) = binary_data();

        let mut a = SVMClassifier::new(SVMConfig {
            random_state: Some(7),
            ..Default::default()
        });
        let mut b = SVMClassifier::new(SVMConfig {
            random_state: Some(7),
            ..Default::default()
        });
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap().to_vec(), b.predict(&x).unwrap().to_vec());
    }

    #[test]
    fn test_decision_function_shape() {
        let (x, y) = binary_data();
        let mut svm = SVMClassifier::default();
        svm.fit(&x, &y).unwrap();

        let scores = svm.decision_function(&x).unwrap();
        assert_eq!(scores.dim(), (8, 1));
    }

    #[test]
    fn test_non_integer_labels_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.5, 1.0];
        let mut svm = SVMClassifier::default();
        assert!(matches!(svm.fit(&x, &y), Err(BenchError::Fit { .. })));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut svm = SVMClassifier::default();
        assert!(matches!(svm.fit(&x, &y), Err(BenchError::Fit { .. })));
    }

    #[test]
    fn test_predict_before_fit() {
        let svm = SVMClassifier::default();
        assert!(matches!(
            svm.predict(&array![[1.0, 2.0]]),
            Err(BenchError::NotFitted)
        ));
    }
}
