//! Scoring helpers for the bench

use ndarray::Array1;

use crate::error::{BenchError, Result};

/// Fraction of predictions matching the true labels, in `[0, 1]`.
///
/// Labels are compared as rounded class keys.
pub fn accuracy_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(BenchError::Shape {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(BenchError::Shape {
            expected: "at least 1 label".into(),
            actual: "0 labels".into(),
        });
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t.round() as i64 == p.round() as i64)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Aggregated per-fold scores from a cross-validation run
#[derive(Debug, Clone)]
pub struct CrossValResults {
    /// Score of each fold
    pub scores: Vec<f64>,
    /// Mean score
    pub mean: f64,
    /// Population standard deviation of the scores
    pub std: f64,
}

impl CrossValResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        if scores.is_empty() {
            return Self {
                scores,
                mean: 0.0,
                std: 0.0,
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}
