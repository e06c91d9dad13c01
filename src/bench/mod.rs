//! Benchmark orchestration
//!
//! Splits the dataset once, fits every roster entry on the training
//! partition, ranks by held-out accuracy, then refits the ranked estimators
//! on the full dataset for probe predictions.

pub mod metrics;
pub mod roster;

pub use metrics::{accuracy_score, CrossValResults};
pub use roster::default_roster;

use std::time::{Duration, Instant};

use ndarray::{Array1, Array2};
use tracing::{debug, info, warn};

use crate::config::BenchConfig;
use crate::data::split::{stratified_k_fold, train_validation_split};
use crate::data::Dataset;
use crate::error::{BenchError, Result};
use crate::models::Classifier;

/// One named estimator awaiting evaluation
pub struct RosterEntry {
    pub name: String,
    pub model: Box<dyn Classifier>,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, model: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}

/// Ranked outcome for one estimator; keeps the fitted model so it can be
/// refit later without rebuilding the roster.
pub struct ResultRecord {
    pub name: String,
    pub model: Box<dyn Classifier>,
    /// Held-out accuracy in `[0, 1]`
    pub accuracy: f64,
    /// Wall time of the training fit
    pub fit_time: Duration,
}

/// A hand-picked probe row with the label it should get
#[derive(Debug, Clone)]
pub struct Sample {
    pub features: Vec<f64>,
    pub expected: String,
}

impl Sample {
    pub fn new(features: Vec<f64>, expected: impl Into<String>) -> Self {
        Self {
            features,
            expected: expected.into(),
        }
    }
}

/// Predicted vs expected class name for one probe
#[derive(Debug, Clone)]
pub struct SamplePrediction {
    pub predicted: String,
    pub expected: String,
}

/// Outcome of one estimator's full-data refit
#[derive(Debug, Clone)]
pub struct RefitReport {
    pub name: String,
    /// Validation accuracy carried over from the ranking
    pub accuracy: f64,
    pub predictions: Vec<SamplePrediction>,
}

/// The bench context: one dataset, one config, no global state.
pub struct ModelBench {
    config: BenchConfig,
    dataset: Dataset,
}

impl ModelBench {
    /// Build a bench over a loaded dataset. The config is validated and the
    /// dataset width must match the configured schema.
    pub fn new(config: BenchConfig, dataset: Dataset) -> Result<Self> {
        config.validate()?;
        if dataset.n_features() != config.n_features {
            return Err(BenchError::SchemaMismatch {
                expected: config.n_features + 1,
                actual: dataset.n_features() + 1,
            });
        }
        Ok(Self { config, dataset })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Deterministic train/validation partition of the loaded rows
    pub fn split(&self) -> Result<(Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>)> {
        let split = train_validation_split(
            self.dataset.n_rows(),
            self.config.validation_split,
            self.config.random_state,
        )?;
        let (x_train, y_train) = self.dataset.subset(&split.train_indices);
        let (x_val, y_val) = self.dataset.subset(&split.validation_indices);
        Ok((x_train, y_train, x_val, y_val))
    }

    /// Fit every roster entry on the training partition and score it on the
    /// held-out one. A failing estimator is logged and skipped rather than
    /// aborting the run. Results come back sorted by accuracy, best first;
    /// equal accuracies keep their roster order.
    pub fn evaluate(&self, roster: Vec<RosterEntry>) -> Result<Vec<ResultRecord>> {
        let (x_train, y_train, x_val, y_val) = self.split()?;
        info!(
            train_rows = x_train.nrows(),
            validation_rows = x_val.nrows(),
            estimators = roster.len(),
            "evaluating roster"
        );

        let mut records = Vec::with_capacity(roster.len());
        for mut entry in roster {
            let started = Instant::now();
            if let Err(err) = entry.model.fit(&x_train, &y_train) {
                warn!("{} failed to fit: {}", entry.name, err);
                continue;
            }
            let fit_time = started.elapsed();

            let predictions = match entry.model.predict(&x_val) {
                Ok(p) => p,
                Err(err) => {
                    warn!("{} failed to predict: {}", entry.name, err);
                    continue;
                }
            };
            let accuracy = match accuracy_score(&y_val, &predictions) {
                Ok(a) => a,
                Err(err) => {
                    warn!("{} produced unusable predictions: {}", entry.name, err);
                    continue;
                }
            };

            debug!(
                "{}: validation accuracy {:.4} in {:.3}s",
                entry.name,
                accuracy,
                fit_time.as_secs_f64()
            );
            records.push(ResultRecord {
                name: entry.name,
                model: entry.model,
                accuracy,
                fit_time,
            });
        }

        // sort_by is stable, so ties keep their roster order
        records.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
        Ok(records)
    }

    /// Refit each ranked estimator on the full dataset (the same instance,
    /// trained a second time) and predict the probe samples. Records keep
    /// their ranking order; an estimator failing its refit is logged and
    /// dropped from the reports.
    pub fn refit_and_predict(
        &self,
        records: &mut [ResultRecord],
        samples: &[Sample],
    ) -> Result<Vec<RefitReport>> {
        let n_features = self.dataset.n_features();
        for (idx, sample) in samples.iter().enumerate() {
            if sample.features.len() != n_features {
                return Err(BenchError::Shape {
                    expected: format!("{} features", n_features),
                    actual: format!("{} features in sample {}", sample.features.len(), idx),
                });
            }
        }
        let x_probe =
            Array2::from_shape_fn((samples.len(), n_features), |(i, j)| samples[i].features[j]);

        let mut reports = Vec::with_capacity(records.len());
        for record in records.iter_mut() {
            if let Err(err) = record.model.fit(&self.dataset.features, &self.dataset.labels) {
                warn!("{} failed its full-data refit: {}", record.name, err);
                continue;
            }
            let predicted = match record.model.predict(&x_probe) {
                Ok(p) => p,
                Err(err) => {
                    warn!("{} failed to predict the probe samples: {}", record.name, err);
                    continue;
                }
            };

            let predictions = samples
                .iter()
                .zip(predicted.iter())
                .map(|(sample, &label)| SamplePrediction {
                    predicted: self
                        .dataset
                        .class_name(label)
                        .unwrap_or("?")
                        .to_string(),
                    expected: sample.expected.clone(),
                })
                .collect();

            reports.push(RefitReport {
                name: record.name.clone(),
                accuracy: record.accuracy,
                predictions,
            });
        }
        Ok(reports)
    }

    /// Stratified k-fold cross-validation of one estimator over the full
    /// dataset, refitting it once per fold.
    pub fn cross_validate(&self, entry: &mut RosterEntry, n_folds: usize) -> Result<CrossValResults> {
        let folds = stratified_k_fold(&self.dataset.labels, n_folds, self.config.random_state)?;

        let mut scores = Vec::with_capacity(folds.len());
        for fold in &folds {
            let (x_train, y_train) = self.dataset.subset(&fold.train_indices);
            let (x_test, y_test) = self.dataset.subset(&fold.test_indices);
            entry.model.fit(&x_train, &y_train)?;
            let predictions = entry.model.predict(&x_test)?;
            scores.push(accuracy_score(&y_test, &predictions)?);
        }

        debug!(
            "{}: {}-fold cross-validation complete",
            entry.name,
            folds.len()
        );
        Ok(CrossValResults::from_scores(scores))
    }
}

/// Render the ranked results as a printable table
pub fn ranking_report(records: &[ResultRecord]) -> String {
    let width = records.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::from("Model ranking (validation accuracy):\n");
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {:<width$}  {:>6.2}%  (fit in {:.3}s)\n",
            i + 1,
            record.name,
            record.accuracy * 100.0,
            record.fit_time.as_secs_f64(),
            width = width
        ));
    }
    out
}

/// Render the probe rows that are about to be predicted
pub fn sample_report(samples: &[Sample], feature_names: &[String]) -> String {
    let mut out = String::from("Data to be evaluated:\n");
    for sample in samples {
        let fields: Vec<String> = feature_names
            .iter()
            .zip(&sample.features)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        out.push_str(&format!("  {}\n", fields.join(", ")));
    }
    out
}

/// Render predicted vs expected labels per refit estimator
pub fn prediction_report(reports: &[RefitReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str(&format!(
            "Running samples using {} (validation accuracy {:.2}%)...\n",
            report.name,
            report.accuracy * 100.0
        ));
        for (i, prediction) in report.predictions.iter().enumerate() {
            out.push_str(&format!(
                "Sample #{}: Prediction: {} (expected {})\n",
                i + 1,
                prediction.predicted,
                prediction.expected
            ));
        }
        out.push('\n');
    }
    out
}
