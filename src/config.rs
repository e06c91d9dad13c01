//! Bench configuration

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Feature column names expected in the input file, in order.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "air_speed",
    "rel_humid",
    "meta_rate",
    "cloth_lvl",
    "oper_temp",
];

/// Ordered thermal sensation class names; the position of a name is the class
/// index used by every model.
pub const CLASS_NAMES: [&str; 7] = [
    "Cold",
    "Cool",
    "Slightly Cool",
    "Neutral",
    "Slightly Warm",
    "Warm",
    "Hot",
];

/// Configuration for a bench run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Fraction of rows held out for validation scoring
    pub validation_split: f64,

    /// Seed for the split shuffle and for every seeded estimator
    pub random_state: u64,

    /// Expected number of feature columns in the input file
    pub n_features: usize,

    /// Ordered class names; position = class index
    pub classes: Vec<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            validation_split: 0.2,
            random_state: 1,
            n_features: FEATURE_COLUMNS.len(),
            classes: CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl BenchConfig {
    /// Builder method to set the validation fraction
    pub fn with_validation_split(mut self, fraction: f64) -> Self {
        self.validation_split = fraction;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set the expected schema
    pub fn with_schema(mut self, n_features: usize, classes: Vec<String>) -> Self {
        self.n_features = n_features;
        self.classes = classes;
        self
    }

    /// Check that every value is inside its domain.
    pub fn validate(&self) -> Result<()> {
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(BenchError::InvalidParameter {
                name: "validation_split".to_string(),
                value: self.validation_split.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }
        if self.n_features == 0 {
            return Err(BenchError::InvalidParameter {
                name: "n_features".to_string(),
                value: "0".to_string(),
                reason: "at least one feature column is required".to_string(),
            });
        }
        if self.classes.len() < 2 {
            return Err(BenchError::InvalidParameter {
                name: "classes".to_string(),
                value: self.classes.len().to_string(),
                reason: "at least two class names are required".to_string(),
            });
        }
        Ok(())
    }
}
