//! Thermal comfort model bench
//!
//! Loads a labeled thermal comfort dataset, trains a fixed roster of seven
//! classifiers, ranks them by held-out accuracy, then refits each estimator
//! on the full data to predict hand-picked probe samples.
//!
//! # Modules
//!
//! - [`config`] - Bench configuration and the expected file schema
//! - [`data`] - CSV loading and deterministic train/validation splits
//! - [`models`] - The classifier implementations behind the roster
//! - [`bench`] - Orchestration: evaluate, rank, refit, report
//! - [`error`] - The crate error type

pub mod bench;
pub mod config;
pub mod data;
pub mod error;
pub mod models;

pub use error::{BenchError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::bench::{
        default_roster, ModelBench, RefitReport, ResultRecord, RosterEntry, Sample,
    };
    pub use crate::config::{BenchConfig, CLASS_NAMES, FEATURE_COLUMNS};
    pub use crate::data::loader::DatasetLoader;
    pub use crate::data::Dataset;
    pub use crate::error::{BenchError, Result};
    pub use crate::models::Classifier;
}
