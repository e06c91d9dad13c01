//! Linear discriminant analysis

use ndarray::{Array1, Array2};

use super::{check_fit_shapes, unique_classes, Classifier};
use crate::error::{BenchError, Result};

/// Linear discriminant analysis with a pooled within-class covariance.
///
/// Each class `k` gets a linear discriminant
/// `d_k(x) = x . w_k - (mu_k . w_k) / 2 + ln(prior_k)` where `Sigma w_k = mu_k`
/// is solved by Cholesky factorization; prediction is the arg-max over the
/// discriminants.
#[derive(Debug, Clone)]
pub struct LinearDiscriminantAnalysis {
    /// Ridge added to the covariance diagonal when factorization fails
    pub jitter: f64,
    /// Discriminant weights, one row per class
    coef: Option<Array2<f64>>,
    /// Discriminant offsets, one per class
    intercepts: Option<Array1<f64>>,
    /// Class keys in sorted order
    classes: Vec<i64>,
}

impl Default for LinearDiscriminantAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearDiscriminantAnalysis {
    /// Create a new LDA model
    pub fn new() -> Self {
        Self {
            jitter: 1e-6,
            coef: None,
            intercepts: None,
            classes: Vec::new(),
        }
    }

    /// Set the fallback ridge strength
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Solve `Sigma w = mu` for every class mean, escalating the diagonal
    /// ridge until the factorization succeeds.
    fn solve_discriminants(
        &self,
        pooled: &Array2<f64>,
        means: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let d = pooled.nrows();
        for attempt in 0..4 {
            let mut sigma = pooled.clone();
            if attempt > 0 {
                let ridge = self.jitter * 100f64.powi(attempt - 1);
                for i in 0..d {
                    sigma[[i, i]] += ridge;
                }
            }

            let mut coef = Array2::zeros((means.nrows(), d));
            let mut solved = true;
            for (k, mean) in means.rows().into_iter().enumerate() {
                match cholesky_solve(&sigma, &mean.to_owned()) {
                    Some(w) => coef.row_mut(k).assign(&w),
                    None => {
                        solved = false;
                        break;
                    }
                }
            }
            if solved {
                return Ok(coef);
            }
        }

        Err(BenchError::fit(
            "linear discriminant analysis",
            "pooled covariance is not positive definite even with a ridge",
        ))
    }
}

impl Classifier for LinearDiscriminantAnalysis {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        let classes = unique_classes(y);
        let k = classes.len();
        if k < 2 {
            return Err(BenchError::fit(
                "linear discriminant analysis",
                "requires at least 2 distinct classes",
            ));
        }

        let n = x.nrows();
        let d = x.ncols();
        if n <= k {
            return Err(BenchError::fit(
                "linear discriminant analysis",
                "needs more rows than classes to pool a covariance",
            ));
        }

        // Per-class means and priors
        let mut means: Array2<f64> = Array2::zeros((k, d));
        let mut counts = vec![0usize; k];
        let class_of: Vec<usize> = y
            .iter()
            .map(|&v| {
                let key = v.round() as i64;
                classes.iter().position(|&c| c == key).unwrap_or(0)
            })
            .collect();
        for (i, &c) in class_of.iter().enumerate() {
            counts[c] += 1;
            for j in 0..d {
                means[[c, j]] += x[[i, j]];
            }
        }
        for (c, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            for j in 0..d {
                means[[c, j]] /= count as f64;
            }
        }

        // Pooled within-class covariance, normalized by n - k
        let mut pooled: Array2<f64> = Array2::zeros((d, d));
        for (i, &c) in class_of.iter().enumerate() {
            for a in 0..d {
                let da = x[[i, a]] - means[[c, a]];
                for b in a..d {
                    let db = x[[i, b]] - means[[c, b]];
                    pooled[[a, b]] += da * db;
                }
            }
        }
        let norm = (n - k) as f64;
        for a in 0..d {
            for b in a..d {
                pooled[[a, b]] /= norm;
                pooled[[b, a]] = pooled[[a, b]];
            }
        }

        let coef = self.solve_discriminants(&pooled, &means)?;

        let mut intercepts = Array1::zeros(k);
        for c in 0..k {
            let mean = means.row(c);
            let w = coef.row(c);
            let prior = counts[c] as f64 / n as f64;
            intercepts[c] = -0.5 * mean.dot(&w) + prior.ln();
        }

        self.classes = classes;
        self.coef = Some(coef);
        self.intercepts = Some(intercepts);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coef = self.coef.as_ref().ok_or(BenchError::NotFitted)?;
        let intercepts = self.intercepts.as_ref().ok_or(BenchError::NotFitted)?;

        let scores = x.dot(&coef.t()) + intercepts;
        let mut predictions = Array1::zeros(x.nrows());
        for (i, row) in scores.rows().into_iter().enumerate() {
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

/// Solve the symmetric positive-definite system `A x = b` by Cholesky
/// decomposition. Returns `None` when `A` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l: Array2<f64> = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y: Array1<f64> = Array1::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x: Array1<f64> = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}
