//! Deterministic dataset partitioning
//!
//! Every partition here is driven by an explicit seed: the same seed and the
//! same inputs always produce the same index sets. Reproducible benchmarking
//! depends on this, so there is no unseeded path.

use std::collections::BTreeMap;

use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{BenchError, Result};

/// The hold-out partition used by the bench
#[derive(Debug, Clone)]
pub struct TrainValidationSplit {
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
}

/// A single train/test fold
#[derive(Debug, Clone)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Shuffle `0..n_samples` with the seed and hold out the trailing
/// `⌊n_samples * validation_fraction⌋` indices for validation.
///
/// Training and validation sets are disjoint and together cover every index.
pub fn train_validation_split(
    n_samples: usize,
    validation_fraction: f64,
    seed: u64,
) -> Result<TrainValidationSplit> {
    if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
        return Err(BenchError::InvalidParameter {
            name: "validation_fraction".to_string(),
            value: validation_fraction.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let validation_size = (n_samples as f64 * validation_fraction) as usize;
    if validation_size == 0 || validation_size == n_samples {
        return Err(BenchError::InvalidParameter {
            name: "validation_fraction".to_string(),
            value: validation_fraction.to_string(),
            reason: format!("leaves an empty partition for {} samples", n_samples),
        });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train_size = n_samples - validation_size;
    let validation_indices = indices.split_off(train_size);

    Ok(TrainValidationSplit {
        train_indices: indices,
        validation_indices,
    })
}

/// Shuffled k-fold partition: every index lands in exactly one test fold.
pub fn k_fold(n_samples: usize, n_folds: usize, seed: u64) -> Result<Vec<FoldSplit>> {
    check_fold_count(n_samples, n_folds)?;

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let base = n_samples / n_folds;
    let remainder = n_samples % n_folds;

    let mut splits = Vec::with_capacity(n_folds);
    let mut current = 0;
    for fold_idx in 0..n_folds {
        let fold_size = if fold_idx < remainder { base + 1 } else { base };
        let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
        let train_indices: Vec<usize> = indices[..current]
            .iter()
            .chain(indices[current + fold_size..].iter())
            .copied()
            .collect();

        splits.push(FoldSplit {
            train_indices,
            test_indices,
            fold_idx,
        });

        current += fold_size;
    }

    Ok(splits)
}

/// Stratified k-fold: per-class shuffling, then round-robin dealing so each
/// fold preserves the class proportions within rounding.
///
/// Every class must have at least `n_folds` members.
pub fn stratified_k_fold(
    labels: &Array1<f64>,
    n_folds: usize,
    seed: u64,
) -> Result<Vec<FoldSplit>> {
    check_fold_count(labels.len(), n_folds)?;

    // BTreeMap keeps class iteration order stable across runs.
    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &value) in labels.iter().enumerate() {
        class_indices.entry(value.round() as i64).or_default().push(idx);
    }

    for (class, indices) in &class_indices {
        if indices.len() < n_folds {
            return Err(BenchError::InvalidParameter {
                name: "n_folds".to_string(),
                value: n_folds.to_string(),
                reason: format!(
                    "class {} has only {} member(s), fewer than the fold count",
                    class,
                    indices.len()
                ),
            });
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for indices in class_indices.values_mut() {
        indices.shuffle(&mut rng);
    }

    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
    for indices in class_indices.values() {
        for (i, &idx) in indices.iter().enumerate() {
            folds[i % n_folds].push(idx);
        }
    }

    let mut splits = Vec::with_capacity(n_folds);
    for fold_idx in 0..n_folds {
        let test_indices = folds[fold_idx].clone();
        let train_indices: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold_idx)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();

        splits.push(FoldSplit {
            train_indices,
            test_indices,
            fold_idx,
        });
    }

    Ok(splits)
}

fn check_fold_count(n_samples: usize, n_folds: usize) -> Result<()> {
    if n_folds < 2 {
        return Err(BenchError::InvalidParameter {
            name: "n_folds".to_string(),
            value: n_folds.to_string(),
            reason: "must be at least 2".to_string(),
        });
    }
    if n_samples < n_folds {
        return Err(BenchError::InvalidParameter {
            name: "n_folds".to_string(),
            value: n_folds.to_string(),
            reason: format!("exceeds the {} available samples", n_samples),
        });
    }
    Ok(())
}
