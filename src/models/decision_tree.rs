//! Decision tree classifier

use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{check_fit_shapes, Classifier};
use crate::error::{BenchError, Result};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf with a class prediction
    Leaf { prediction: f64, n_samples: usize },
    /// Internal node with a binary split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity
    Gini,
    /// Information entropy
    Entropy,
}

impl Default for Criterion {
    fn default() -> Self {
        Self::Gini
    }
}

/// CART-style decision tree classifier.
///
/// Thresholds are midpoints between consecutive distinct feature values;
/// the split scan over candidate features runs in parallel. With
/// `max_features` set, each node considers a seeded random feature subset,
/// which is what a random forest wants from its trees.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    /// Maximum tree depth, unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples required in each child
    pub min_samples_leaf: usize,
    /// Features considered per node, all when `None`
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for the per-node feature subsets
    pub random_state: Option<u64>,
    root: Option<TreeNode>,
    feature_importances: Option<Array1<f64>>,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: None,
            root: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
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

    /// Set the impurity criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set features considered per node
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set the feature subset seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Impurity-weighted importance of each feature, if fitted
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Depth of the fitted tree, counting the root as 1
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Number of leaves in the fitted tree
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || is_pure(&y_subset);
        if should_stop {
            return TreeNode::Leaf {
                prediction: majority_class(&y_subset),
                n_samples,
            };
        }

        // Draw the candidate features sequentially so the rng stream does
        // not depend on scan parallelism.
        let features = self.node_features(x.ncols(), rng);

        if let Some((best_feature, best_threshold, best_gain)) =
            self.find_best_split(x, y, indices, &features)
        {
            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .partition(|&&i| x[[i, best_feature]] <= best_threshold);

            if left_indices.len() < self.min_samples_leaf
                || right_indices.len() < self.min_samples_leaf
            {
                return TreeNode::Leaf {
                    prediction: majority_class(&y_subset),
                    n_samples,
                };
            }

            importances[best_feature] += n_samples as f64 * best_gain;

            let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
            let right =
                Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

            TreeNode::Split {
                feature_idx: best_feature,
                threshold: best_threshold,
                left,
                right,
                n_samples,
                impurity: self.impurity_of(&y_subset),
            }
        } else {
            TreeNode::Leaf {
                prediction: majority_class(&y_subset),
                n_samples,
            }
        }
    }

    /// Candidate feature indices for one node
    fn node_features(&self, n_features: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let n_pick = self.max_features.unwrap_or(n_features).min(n_features);
        if n_pick >= n_features {
            return (0..n_features).collect();
        }

        // Partial Fisher-Yates draw of n_pick distinct indices
        let mut pool: Vec<usize> = (0..n_features).collect();
        for i in 0..n_pick {
            let j = rng.gen_range(i..n_features);
            pool.swap(i, j);
        }
        pool.truncate(n_pick);
        pool
    }

    /// Best `(feature, threshold, gain)` over the candidate features, or
    /// `None` when no split improves impurity.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
    ) -> Option<(usize, f64, f64)> {
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = self.impurity_of(&y_subset);
        let n = indices.len() as f64;

        let feature_results: Vec<Option<(usize, f64, f64)>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
                values.sort_by(|a, b| a.total_cmp(b));
                values.dedup();

                let mut best_gain = 0.0f64;
                let mut best_threshold = 0.0f64;

                for window in values.windows(2) {
                    let threshold = (window[0] + window[1]) / 2.0;

                    let mut left_count = 0usize;
                    let mut right_count = 0usize;
                    let mut left_classes: BTreeMap<i64, usize> = BTreeMap::new();
                    let mut right_classes: BTreeMap<i64, usize> = BTreeMap::new();
                    for &idx in indices {
                        let label = y[idx].round() as i64;
                        if x[[idx, feature_idx]] <= threshold {
                            left_count += 1;
                            *left_classes.entry(label).or_insert(0) += 1;
                        } else {
                            right_count += 1;
                            *right_classes.entry(label).or_insert(0) += 1;
                        }
                    }

                    if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                        continue;
                    }

                    let weighted_impurity = (left_count as f64
                        * self.impurity_from_counts(left_count, &left_classes)
                        + right_count as f64 * self.impurity_from_counts(right_count, &right_classes))
                        / n;

                    let gain = parent_impurity - weighted_impurity;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = threshold;
                    }
                }

                if best_gain > 0.0 {
                    Some((feature_idx, best_threshold, best_gain))
                } else {
                    None
                }
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| a.2.total_cmp(&b.2))
    }

    fn impurity_of(&self, y: &[f64]) -> f64 {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for &val in y {
            *counts.entry(val.round() as i64).or_insert(0) += 1;
        }
        self.impurity_from_counts(y.len(), &counts)
    }

    fn impurity_from_counts(&self, count: usize, class_counts: &BTreeMap<i64, usize>) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let n = count as f64;
        match self.criterion {
            Criterion::Gini => {
                let sum_sq: f64 = class_counts
                    .values()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum();
                1.0 - sum_sq
            }
            Criterion::Entropy => -class_counts
                .values()
                .map(|&c| {
                    let p = c as f64 / n;
                    if p > 0.0 {
                        p * p.ln()
                    } else {
                        0.0
                    }
                })
                .sum::<f64>(),
        }
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_shapes(x, y)?;

        if x.nrows() < self.min_samples_split {
            return Err(BenchError::fit(
                "decision tree",
                format!(
                    "needs at least {} rows to split, got {}",
                    self.min_samples_split,
                    x.nrows()
                ),
            ));
        }
        if self.max_features == Some(0) {
            return Err(BenchError::InvalidParameter {
                name: "max_features".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        self.n_features = x.ncols();

        let mut importances = vec![0.0; x.ncols()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let root = self.build_tree(x, y, &indices, 0, &mut importances, &mut rng);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BenchError::NotFitted)?;

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| predict_sample(root, row))
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

fn predict_sample(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
    match node {
        TreeNode::Leaf { prediction, .. } => *prediction,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn is_pure(y: &[f64]) -> bool {
    match y.first() {
        None => true,
        Some(&first) => y.iter().all(|&v| (v - first).abs() < 1e-10),
    }
}

/// Most common class; ties go to the smallest class key
fn majority_class(y: &[f64]) -> f64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for &val in y {
        *counts.entry(val.round() as i64).or_insert(0) += 1;
    }

    let mut best_class = 0.0;
    let mut best_count = 0usize;
    for (class, count) in counts {
        if count > best_count {
            best_count = count;
            best_class = class as f64;
        }
    }
    best_class
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn three_band_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 0.5],
            [1.2, 0.4],
            [1.4, 0.6],
            [5.0, 0.5],
            [5.2, 0.4],
            [5.4, 0.6],
            [9.0, 0.5],
            [9.2, 0.4],
            [9.4, 0.6],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];
        (x, y)
    }

    #[test]
    fn test_separable_split() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
        assert!(tree.get_n_leaves() >= 2);
    }

    #[test]
    fn test_three_bands() {
        let (x, y) = three_band_data();
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_entropy_criterion() {
        let (x, y) = three_band_data();
        let mut tree = DecisionTree::new().with_criterion(Criterion::Entropy);
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), y.to_vec());
    }

    #[test]
    fn test_max_depth_capped() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
    }

    #[test]
    fn test_feature_importances() {
        // Second feature is constant and can never split.
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!(importances[0] > 0.9);
        assert!(importances[1] < 1e-12);
    }

    #[test]
    fn test_feature_subset_is_seeded() {
        let (x, y) = three_band_data();

        let mut a = DecisionTree::new().with_max_features(1).with_random_state(7);
        let mut b = DecisionTree::new().with_max_features(1).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap().to_vec(), b.predict(&x).unwrap().to_vec());
    }

    #[test]
    fn test_majority_tie_goes_to_smaller_key() {
        assert_eq!(majority_class(&[2.0, 1.0]), 1.0);
        assert_eq!(majority_class(&[3.0, 3.0, 0.0]), 3.0);
    }

    #[test]
    fn test_too_few_rows_rejected() {
        let x = array![[1.0]];
        let y = array![0.0];
        let mut tree = DecisionTree::new();
        assert!(matches!(tree.fit(&x, &y), Err(BenchError::Fit { .. })));
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0, 2.0]]),
            Err(BenchError::NotFitted)
        ));
    }
}
