//! Dataset representation and partitioning

pub mod loader;
pub mod split;

use ndarray::{Array1, Array2};

/// A loaded tabular dataset: numeric features plus a categorical label per
/// row, encoded as a class index.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Row-major feature matrix
    pub features: Array2<f64>,
    /// Class index per row, aligned with `features`
    pub labels: Array1<f64>,
    /// Feature column names, in file order
    pub feature_names: Vec<String>,
    /// Ordered class names; position = class index
    pub classes: Vec<String>,
}

impl Dataset {
    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Number of known classes
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Class name for a label value, if the rounded index is in range.
    pub fn class_name(&self, label: f64) -> Option<&str> {
        let index = label.round();
        if index < 0.0 {
            return None;
        }
        self.classes.get(index as usize).map(String::as_str)
    }

    /// Materialize the rows at `indices` as an owned feature/label pair.
    pub fn subset(&self, indices: &[usize]) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((indices.len(), self.n_features()), |(i, j)| {
            self.features[[indices[i], j]]
        });
        let y = Array1::from_shape_fn(indices.len(), |i| self.labels[indices[i]]);
        (x, y)
    }

    /// Row count per class index.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &label in self.labels.iter() {
            let index = label.round();
            if index >= 0.0 && (index as usize) < counts.len() {
                counts[index as usize] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_class_dataset() -> Dataset {
        Dataset {
            features: array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0]],
            labels: array![0.0, 1.0, 0.0, 1.0],
            feature_names: vec!["a".to_string(), "b".to_string()],
            classes: vec!["no".to_string(), "yes".to_string()],
        }
    }

    #[test]
    fn test_subset_materializes_rows_in_order() {
        let dataset = two_class_dataset();
        let (x, y) = dataset.subset(&[2, 0]);

        assert_eq!(x, array![[5.0, 6.0], [1.0, 2.0]]);
        assert_eq!(y, array![0.0, 0.0]);
    }

    #[test]
    fn test_class_name_bounds() {
        let dataset = two_class_dataset();
        assert_eq!(dataset.class_name(0.0), Some("no"));
        assert_eq!(dataset.class_name(1.2), Some("yes"));
        assert_eq!(dataset.class_name(2.0), None);
        assert_eq!(dataset.class_name(-1.0), None);
    }

    #[test]
    fn test_class_counts() {
        let dataset = two_class_dataset();
        assert_eq!(dataset.class_counts(), vec![2, 2]);
    }
}
