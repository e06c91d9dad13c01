//! CSV ingestion

use std::fs::File;

use ndarray::{Array1, Array2};
use polars::prelude::*;
use tracing::debug;

use crate::data::Dataset;
use crate::error::{BenchError, Result};

/// Loads a delimited tabular file into a [`Dataset`].
///
/// Feature columns are all columns but the last; the trailing column is the
/// label. The column count is checked against the expected schema before any
/// value is decoded; nothing else about the schema is validated.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    /// Expected feature column count (`None` = accept any width >= 2)
    expected_features: Option<usize>,
    /// Rows polars samples to infer column types
    infer_schema_length: Option<usize>,
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            expected_features: None,
            infer_schema_length: Some(100),
        }
    }

    /// Require exactly `n` feature columns (plus the trailing label column)
    pub fn with_expected_features(mut self, n: usize) -> Self {
        self.expected_features = Some(n);
        self
    }

    /// Load a CSV file with a header row.
    ///
    /// Textual labels are decoded through `classes` (position = class index);
    /// numeric labels are taken as class indices directly.
    pub fn load_csv(&self, path: &str, classes: &[String]) -> Result<Dataset> {
        let file =
            File::open(path).map_err(|e| BenchError::DataLoad(format!("{}: {}", path, e)))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| BenchError::DataLoad(format!("{}: {}", path, e)))?;

        self.dataset_from_frame(&df, classes)
    }

    /// Convert an already-parsed frame into a [`Dataset`].
    pub fn dataset_from_frame(&self, df: &DataFrame, classes: &[String]) -> Result<Dataset> {
        let width = df.width();
        if width < 2 {
            return Err(BenchError::DataLoad(format!(
                "need at least one feature column and a label column, found {} column(s)",
                width
            )));
        }
        if let Some(expected) = self.expected_features {
            if width != expected + 1 {
                return Err(BenchError::SchemaMismatch {
                    expected: expected + 1,
                    actual: width,
                });
            }
        }

        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let n_features = width - 1;
        let feature_names = names[..n_features].to_vec();
        let label_name = &names[n_features];

        let n_rows = df.height();
        let mut features = Array2::zeros((n_rows, n_features));
        for (j, name) in feature_names.iter().enumerate() {
            let column = df.column(name.as_str())?.cast(&DataType::Float64)?;
            let values = column.f64()?;
            for (i, value) in values.into_iter().enumerate() {
                features[[i, j]] = value.ok_or_else(|| {
                    BenchError::DataLoad(format!("null or non-numeric value in '{}' row {}", name, i))
                })?;
            }
        }

        let labels = decode_labels(df.column(label_name.as_str())?, classes)?;

        let dataset = Dataset {
            features,
            labels,
            feature_names,
            classes: classes.to_vec(),
        };

        let distribution: Vec<(&str, usize)> = dataset
            .classes
            .iter()
            .map(String::as_str)
            .zip(dataset.class_counts())
            .collect();
        debug!(
            "loaded {} rows x {} features, label column '{}', class distribution {:?}",
            n_rows, n_features, label_name, distribution
        );

        Ok(dataset)
    }
}

/// Decode the trailing label column into class indices.
fn decode_labels(column: &Column, classes: &[String]) -> Result<Array1<f64>> {
    match column.dtype() {
        DataType::String => {
            let values = column.str()?;
            let mut labels = Array1::zeros(values.len());
            for (i, value) in values.into_iter().enumerate() {
                let name = value
                    .ok_or_else(|| BenchError::DataLoad(format!("null label in row {}", i)))?;
                let index = classes.iter().position(|c| c == name).ok_or_else(|| {
                    BenchError::DataLoad(format!("unknown class label '{}' in row {}", name, i))
                })?;
                labels[i] = index as f64;
            }
            Ok(labels)
        }
        _ => {
            let column = column.cast(&DataType::Float64)?;
            let values = column.f64()?;
            let mut labels = Array1::zeros(values.len());
            for (i, value) in values.into_iter().enumerate() {
                labels[i] = value
                    .ok_or_else(|| BenchError::DataLoad(format!("null label in row {}", i)))?;
            }
            Ok(labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn class_names() -> Vec<String> {
        vec!["low".to_string(), "high".to_string()]
    }

    fn create_test_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_csv_with_string_labels() {
        let file = create_test_csv(&[
            "a,b,label",
            "1.0,2.0,low",
            "3.0,4.0,high",
            "5.0,6.0,low",
        ]);
        let loader = DatasetLoader::new().with_expected_features(2);
        let dataset = loader
            .load_csv(file.path().to_str().unwrap(), &class_names())
            .unwrap();

        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.n_features(), 2);
        assert_eq!(dataset.feature_names, vec!["a", "b"]);
        assert_eq!(dataset.labels.to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(dataset.features[[1, 0]], 3.0);
    }

    #[test]
    fn test_load_csv_with_numeric_labels() {
        let file = create_test_csv(&["a,b,label", "1.0,2.0,0", "3.0,4.0,1"]);
        let loader = DatasetLoader::new();
        let dataset = loader
            .load_csv(file.path().to_str().unwrap(), &class_names())
            .unwrap();

        assert_eq!(dataset.labels.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_wrong_column_count_is_schema_mismatch() {
        let file = create_test_csv(&["a,b,label", "1.0,2.0,low"]);
        let loader = DatasetLoader::new().with_expected_features(5);
        let err = loader
            .load_csv(file.path().to_str().unwrap(), &class_names())
            .unwrap_err();

        assert!(matches!(
            err,
            BenchError::SchemaMismatch {
                expected: 6,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_unknown_class_label_is_data_load_error() {
        let file = create_test_csv(&["a,b,label", "1.0,2.0,scorching"]);
        let loader = DatasetLoader::new();
        let err = loader
            .load_csv(file.path().to_str().unwrap(), &class_names())
            .unwrap_err();

        assert!(matches!(err, BenchError::DataLoad(_)));
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let loader = DatasetLoader::new();
        let err = loader
            .load_csv("does_not_exist.csv", &class_names())
            .unwrap_err();

        assert!(matches!(err, BenchError::DataLoad(_)));
    }

    #[test]
    fn test_single_column_rejected() {
        let file = create_test_csv(&["label", "low", "high"]);
        let loader = DatasetLoader::new();
        let err = loader
            .load_csv(file.path().to_str().unwrap(), &class_names())
            .unwrap_err();

        assert!(matches!(err, BenchError::DataLoad(_)));
    }
}
