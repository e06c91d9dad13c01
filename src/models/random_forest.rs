//! Random forest classifier

use ndarray::{Array1, Array2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::decision_tree::{Criterion, DecisionTree};
use super::{check_fit_shapes, unique_classes, Classifier};
use crate::error::{BenchError, Result};

/// Strategy for features considered per split
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of the feature count
    Sqrt,
    /// Log2 of the feature count
    Log2,
    /// Fraction of the feature count
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

/// Bootstrap-aggregated forest of [`DecisionTree`]s.
///
/// Trees build in parallel; each gets its own seed derived from
/// `random_state`, so a fixed seed gives a fixed forest regardless of
/// thread scheduling.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Features per split
    pub max_features: MaxFeatures,
    /// Draw bootstrap samples per tree
    pub bootstrap: bool,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Base seed for bootstrap and feature draws
    pub random_state: Option<u64>,
    trees: Vec<DecisionTree>,
    feature_importances: Option<Array1<f64>>,
    classes: Vec<i64>,
    n_features: usize,
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            criterion: Criterion::Gini,
            random_state: None,
            trees: Vec::new(),
            feature_importances: None,
            classes: Vec::new(),
            n_features: 0,
        }
    }

    /// Set maximum depth per tree
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples per leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the per-split feature strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the impurity criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the base seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Disable bootstrap sampling
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = false;
        self
    }

    /// Tree-averaged importance of each feature, if fitted
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn compute_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }

    /// Per-tree vote fractions for each class, in class-key order
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let all_predictions = self.tree_predictions(x)?;

        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut probs = Array2::zeros((n_samples, n_classes));
        for i in 0..n_samples {
            for preds in &all_predictions {
                let key = preds[i].round() as i64;
                if let Some(c) = self.classes.iter().position(|&cls| cls == key) {
                    probs[[i, c]] += 1.0;
                }
            }
        }
        probs /= all_predictions.len() as f64;
        Ok(probs)
    }

    fn tree_predictions(&self, x: &Array2<f64>) -> Result<Vec<Array1<f64>>> {
        if self.trees.is_empty() {
            return Err(BenchError::NotFitted);
        }
        self.trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;
        if self.n_estimators == 0 {
            return Err(BenchError::InvalidParameter {
                name: "n_estimators".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.classes = unique_classes(y);
        let max_features = self.compute_max_features(x.ncols());
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let seed = base_seed.wrapping_add(tree_idx as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);

                let sample_indices: Vec<usize> = if self.bootstrap {
                    (0..n_samples)
                        .map(|_| (rng.next_u64() as usize) % n_samples)
                        .collect()
                } else {
                    (0..n_samples).collect()
                };

                // select() keeps the bootstrap copy a single allocation
                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new()
                    .with_min_samples_split(self.min_samples_split)
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_criterion(self.criterion)
                    .with_max_features(max_features)
                    .with_random_state(seed);
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;

        // Average the per-tree importances
        let mut total_importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (i, &val) in imp.iter().enumerate() {
                    total_importances[i] += val;
                }
            }
        }
        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(total_importances));

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let all_predictions = self.tree_predictions(x)?;

        // Majority vote; ties go to the smallest class key
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
                for preds in &all_predictions {
                    *votes.entry(preds[i].round() as i64).or_insert(0) += 1;
                }

                let mut best_class = 0.0;
                let mut best_count = 0usize;
                for (class, count) in votes {
                    if count > best_count {
                        best_count = count;
                        best_class = class as f64;
                    }
                }
                best_class
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}
