//! Classification models and the capability set they share

mod decision_tree;
mod knn;
mod lda;
mod logistic;
mod naive_bayes;
mod random_forest;
mod svm;

pub use decision_tree::{Criterion, DecisionTree};
pub use knn::{DistanceMetric, KNNClassifier, KNNConfig, WeightScheme};
pub use lda::LinearDiscriminantAnalysis;
pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;
pub use random_forest::{MaxFeatures, RandomForestClassifier};
pub use svm::{KernelType, SVMClassifier, SVMConfig};

use ndarray::{Array1, Array2};

use crate::error::{BenchError, Result};

/// Capability set shared by every roster estimator.
///
/// `fit` may be called more than once on the same instance; each call retrains
/// from scratch on the data it is given.
pub trait Classifier: Send + Sync {
    /// Train on `x` (n_samples x n_features) against class-index labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one class index per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Per-feature standardization fitted on training data.
///
/// Gradient and kernel based estimators fit this internally so raw-unit
/// features (humidity in percent next to air speed in m/s) do not dominate
/// the optimization. Constant columns keep a scale of 1.
#[derive(Debug, Clone)]
pub(crate) struct FeatureScaler {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl FeatureScaler {
    pub(crate) fn fit(x: &Array2<f64>) -> Self {
        let n = x.nrows() as f64;
        let means = x.sum_axis(ndarray::Axis(0)) / n;
        let mut stds = Array1::zeros(x.ncols());
        for j in 0..x.ncols() {
            let variance = x
                .column(j)
                .iter()
                .map(|v| (v - means[j]).powi(2))
                .sum::<f64>()
                / n;
            let std = variance.sqrt();
            stds[j] = if std == 0.0 { 1.0 } else { std };
        }
        Self { means, stds }
    }

    pub(crate) fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut out = x.clone();
        for j in 0..out.ncols() {
            let mean = self.means[j];
            let std = self.stds[j];
            out.column_mut(j).mapv_inplace(|v| (v - mean) / std);
        }
        out
    }
}

/// Shape check shared by every `fit` implementation.
pub(crate) fn check_fit_shapes(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(BenchError::Shape {
            expected: "at least 1 row".to_string(),
            actual: "0 rows".to_string(),
        });
    }
    if x.nrows() != y.len() {
        return Err(BenchError::Shape {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    Ok(())
}

/// Distinct class keys in sorted order.
pub(crate) fn unique_classes(y: &Array1<f64>) -> Vec<i64> {
    let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_feature_scaler_centers_and_scales() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = FeatureScaler::fit(&x);
        let scaled = scaler.transform(&x);

        // First column becomes zero-mean with unit variance.
        let mean: f64 = scaled.column(0).sum() / 3.0;
        assert!(mean.abs() < 1e-12);
        assert!((scaled[[0, 0]] + scaled[[2, 0]]).abs() < 1e-12);

        // Constant column is left centered but unscaled.
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_check_fit_shapes() {
        let x = array![[1.0], [2.0]];
        assert!(check_fit_shapes(&x, &array![0.0, 1.0]).is_ok());
        assert!(check_fit_shapes(&x, &array![0.0]).is_err());

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(check_fit_shapes(&empty, &array![]).is_err());
    }

    #[test]
    fn test_unique_classes_sorted() {
        let y = array![2.0, 0.0, 1.0, 2.0, 0.0];
        assert_eq!(unique_classes(&y), vec![0, 1, 2]);
    }
}
