//! Multinomial logistic regression

use ndarray::{Array1, Array2, Axis};

use super::{check_fit_shapes, unique_classes, Classifier, FeatureScaler};
use crate::error::{BenchError, Result};

/// Logistic regression trained with batch gradient descent on the softmax
/// cross-entropy objective, with L2 regularization.
///
/// Features are standardized internally before optimization so descent is
/// well conditioned on raw-unit inputs.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Fitted coefficients, one column per class
    weights: Option<Array2<f64>>,
    /// Fitted intercepts, one per class
    intercepts: Option<Array1<f64>>,
    /// Class keys in sorted order
    classes: Vec<i64>,
    scaler: Option<FeatureScaler>,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self {
            alpha: 0.01,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            weights: None,
            intercepts: None,
            classes: Vec::new(),
            scaler: None,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Row-wise softmax with max subtraction for numeric stability
    fn softmax_rows(z: &Array2<f64>) -> Array2<f64> {
        let mut out = z.clone();
        for mut row in out.rows_mut() {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row.mapv_inplace(|v| v / sum);
        }
        out
    }

    /// Class probabilities per row, columns in sorted class order.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let weights = self.weights.as_ref().ok_or(BenchError::NotFitted)?;
        let intercepts = self.intercepts.as_ref().ok_or(BenchError::NotFitted)?;
        let scaler = self.scaler.as_ref().ok_or(BenchError::NotFitted)?;

        let scaled = scaler.transform(x);
        let logits = scaled.dot(weights) + intercepts;
        Ok(Self::softmax_rows(&logits))
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let classes = unique_classes(y);
        if classes.len() < 2 {
            return Err(BenchError::fit(
                "logistic regression",
                "requires at least 2 distinct classes",
            ));
        }

        let scaler = FeatureScaler::fit(x);
        let scaled = scaler.transform(x);

        let n_samples = scaled.nrows();
        let n_features = scaled.ncols();
        let n_classes = classes.len();

        // One-hot targets, columns in sorted class order
        let mut targets = Array2::zeros((n_samples, n_classes));
        for (i, &value) in y.iter().enumerate() {
            let key = value.round() as i64;
            if let Some(k) = classes.iter().position(|&c| c == key) {
                targets[[i, k]] = 1.0;
            }
        }

        let mut weights: Array2<f64> = Array2::zeros((n_features, n_classes));
        let mut intercepts: Array1<f64> = Array1::zeros(n_classes);
        let lr = self.learning_rate;
        let alpha = self.alpha;

        for _iter in 0..self.max_iter {
            let logits = scaled.dot(&weights) + &intercepts;
            let probs = Self::softmax_rows(&logits);

            let errors = &probs - &targets;
            let dw = scaled.t().dot(&errors) / n_samples as f64 + alpha * &weights;
            let db = errors.sum_axis(Axis(0)) / n_samples as f64;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db.mapv(|v| v * v).sum()).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * &dw;
            intercepts = intercepts - lr * &db;
        }

        self.classes = classes;
        self.weights = Some(weights);
        self.intercepts = Some(intercepts);
        self.scaler = Some(scaler);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let probs = self.predict_proba(x)?;

        let mut predictions = Array1::zeros(probs.nrows());
        for (i, row) in probs.rows().into_iter().enumerate() {
            let mut best = 0;
            let mut best_p = f64::NEG_INFINITY;
            for (k, &p) in row.iter().enumerate() {
                if p > best_p {
                    best_p = p;
                    best = k;
                }
            }
            predictions[i] = self.classes[best] as f64;
        }
        Ok(predictions)
    }
}
