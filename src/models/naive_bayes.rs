//! Gaussian naive Bayes classifier

use ndarray::{Array1, Array2};
use std::f64::consts::PI;

use super::{check_fit_shapes, unique_classes, Classifier};
use crate::error::{BenchError, Result};

/// Gaussian naive Bayes.
///
/// Each feature is modeled as an independent Gaussian per class; prediction
/// maximizes the joint log likelihood plus the class log prior.
#[derive(Debug, Clone)]
pub struct GaussianNaiveBayes {
    /// Smoothing added to every variance
    pub var_smoothing: f64,
    /// Per-class feature means, one row per class
    means: Option<Array2<f64>>,
    /// Per-class feature variances, one row per class
    variances: Option<Array2<f64>>,
    /// Class prior probabilities
    priors: Option<Array1<f64>>,
    /// Class keys in sorted order
    classes: Vec<i64>,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            var_smoothing: 1e-9,
            means: None,
            variances: None,
            priors: None,
            classes: Vec::new(),
        }
    }

    /// Set the variance smoothing parameter
    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    /// Class prior probabilities in class-key order, if fitted
    pub fn class_priors(&self) -> Option<&Array1<f64>> {
        self.priors.as_ref()
    }

    /// Normalized log probabilities, one row per sample
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut log_probs = self.joint_log_likelihood(x)?;

        // Log-sum-exp normalization per row
        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            for val in row.iter_mut() {
                *val = *val - max_val - log_sum;
            }
        }
        Ok(log_probs)
    }

    /// Class probabilities, one row per sample
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(f64::exp))
    }

    /// Unnormalized `ln P(x | c) + ln P(c)` per sample and class
    fn joint_log_likelihood(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self.means.as_ref().ok_or(BenchError::NotFitted)?;
        let variances = self.variances.as_ref().ok_or(BenchError::NotFitted)?;
        let priors = self.priors.as_ref().ok_or(BenchError::NotFitted)?;

        let n_classes = self.classes.len();
        let mut log_probs = Array2::zeros((x.nrows(), n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..n_classes {
                let mut log_likelihood = 0.0;
                for (j, &xi) in row.iter().enumerate() {
                    let mean = means[[c, j]];
                    let var = variances[[c, j]];
                    log_likelihood += -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln());
                }
                log_probs[[i, c]] = priors[c].ln() + log_likelihood;
            }
        }
        Ok(log_probs)
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let classes = unique_classes(y);
        if classes.len() < 2 {
            return Err(BenchError::fit(
                "gaussian naive bayes",
                "requires at least 2 distinct classes",
            ));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let n_classes = classes.len();

        let mut means = Array2::zeros((n_classes, n_features));
        let mut variances = Array2::zeros((n_classes, n_features));
        let mut priors = Array1::zeros(n_classes);

        for (c, &class) in classes.iter().enumerate() {
            // Single-pass Welford accumulation over this class's rows
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for (row, &label) in x.rows().into_iter().zip(y.iter()) {
                if label.round() as i64 != class {
                    continue;
                }
                count += 1;
                for (j, &val) in row.iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / count as f64;
                    let delta2 = val - feature_means[j];
                    feature_m2[j] += delta * delta2;
                }
            }

            priors[c] = count as f64 / n_samples as f64;
            for j in 0..n_features {
                means[[c, j]] = feature_means[j];
                variances[[c, j]] = feature_m2[j] / count as f64 + self.var_smoothing;
            }
        }

        self.classes = classes;
        self.means = Some(means);
        self.variances = Some(variances);
        self.priors = Some(priors);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.joint_log_likelihood(x)?;

        let mut predictions = Array1::zeros(x.nrows());
        for (i, row) in log_probs.rows().into_iter().enumerate() {
            let mut best = 0;
            let mut best_score = f64::NEG_INFINITY;
            for (c, &score) in row.iter().enumerate() {
                if score > best_score {
                    best_score = score;
                    best = c;
                }
            }
            predictions[i] = self.classes[best] as f64;
        }
        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn create_classification_data() -> (Array2<f64>, Array1<f64>) {
        // Two well-separated Gaussian clusters
        let x = Array2::from_shape_vec(
            (20, 2),
            vec![
                // Class 0 (centered around 0, 0)
                -1.0, -1.0, -0.5, -0.5, 0.0, 0.0, 0.5, 0.5, -1.0, 0.0, -0.5, 0.5, 0.0, -0.5, 0.5,
                -1.0, -0.2, -0.8, -0.8, -0.2,
                // Class 1 (centered around 5, 5)
                4.0, 4.0, 4.5, 4.5, 5.0, 5.0, 5.5, 5.5, 4.0, 5.0, 4.5, 5.5, 5.0, 4.5, 5.5, 4.0,
                4.2, 4.8, 4.8, 4.2,
            ],
        )
        .unwrap();

        let y = Array1::from_vec(vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0,
            1.0, 1.0, 1.0,
        ]);

        (x, y)
    }

    #[test]
    fn test_separated_clusters() {
        let (x, y) = create_classification_data();

        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y).unwrap();

        let predictions = nb.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = create_classification_data();

        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y).unwrap();

        let proba = nb.predict_proba(&x).unwrap();
        for row in proba.rows() {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "rows should sum to 1, got {}", sum);
        }
    }

    #[test]
    fn test_balanced_priors() {
        let (x, y) = create_classification_data();

        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y).unwrap();

        let priors = nb.class_priors().unwrap();
        assert!((priors[0] - 0.5).abs() < 1e-12);
        assert!((priors[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_constant_feature_is_harmless() {
        // Second feature is constant: smoothing keeps its variance positive
        // and classification rides on the first feature.
        let x = array![
            [0.0, 7.0],
            [0.2, 7.0],
            [0.1, 7.0],
            [5.0, 7.0],
            [5.2, 7.0],
            [5.1, 7.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut nb = GaussianNaiveBayes::new();
        nb.fit(&x, &y).unwrap();

        let predictions = nb.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_predict_before_fit() {
        let nb = GaussianNaiveBayes::new();
        assert!(matches!(
            nb.predict(&array![[1.0, 2.0]]),
            Err(BenchError::NotFitted)
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut nb = GaussianNaiveBayes::new();
        assert!(matches!(nb.fit(&x, &y), Err(BenchError::Fit { .. })));
    }
}
