//! Integration test: full bench flow (load → split → rank → refit → predict)

use std::io::Write;

use ndarray::{Array1, Array2};
use thermobench::bench::{default_roster, ModelBench, ResultRecord, Sample};
use thermobench::config::BenchConfig;
use thermobench::data::loader::DatasetLoader;
use thermobench::data::Dataset;
use thermobench::error::BenchError;

const SEED: u64 = 1;

/// 100 rows, 5 features, 7 classes, generated without any rng. Classes are
/// separated in every feature with small within-class scatter, so every
/// roster model can fit it.
fn synthetic_dataset(config: &BenchConfig) -> Dataset {
    let n = 100;
    let labels = Array1::from_shape_fn(n, |i| (i % 7) as f64);
    let features = Array2::from_shape_fn((n, 5), |(i, j)| {
        let class = (i % 7) as f64;
        let scatter = ((i * 13 + j * 7) % 17) as f64 * 0.3;
        class * (10.0 + j as f64) + scatter
    });

    Dataset {
        features,
        labels,
        feature_names: (0..5).map(|j| format!("f{}", j)).collect(),
        classes: config.classes.clone(),
    }
}

fn probe_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![0.1, 50.0, 1.0, 0.61, 23.0], "Slightly Cool"),
        Sample::new(vec![0.1, 60.0, 1.0, 0.61, 26.0], "Neutral"),
        Sample::new(vec![0.1, 76.0, 1.0, 0.61, 28.0], "Slightly Warm"),
    ]
}

#[test]
fn test_synthetic_hundred_rows_ranks_all_seven() {
    let config = BenchConfig::default();
    let bench = ModelBench::new(config.clone(), synthetic_dataset(&config)).unwrap();

    // Step 1: Split
    let (x_train, y_train, x_val, y_val) = bench.split().unwrap();
    assert_eq!(x_train.nrows(), 80);
    assert_eq!(x_val.nrows(), 20);
    assert_eq!(y_train.len(), 80);
    assert_eq!(y_val.len(), 20);

    // Step 2: Evaluate the full roster
    let records = bench.evaluate(default_roster(SEED)).unwrap();
    assert_eq!(records.len(), 7, "every roster entry should produce a record");

    // Step 3: Verify the ranking
    for record in &records {
        assert!(
            (0.0..=1.0).contains(&record.accuracy),
            "{} accuracy out of range: {}",
            record.name,
            record.accuracy
        );
    }
    for pair in records.windows(2) {
        assert!(
            pair[0].accuracy >= pair[1].accuracy,
            "ranking should be sorted descending"
        );
    }
}

#[test]
fn test_ranking_is_deterministic_for_seed() {
    let config = BenchConfig::default();
    let bench = ModelBench::new(config.clone(), synthetic_dataset(&config)).unwrap();

    let first = bench.evaluate(default_roster(SEED)).unwrap();
    let second = bench.evaluate(default_roster(SEED)).unwrap();

    fn names(records: &[ResultRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }
    assert_eq!(names(&first), names(&second), "ranking order should repeat");
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(
            a.accuracy, b.accuracy,
            "{} should score identically across runs",
            a.name
        );
    }
}

#[test]
fn test_malformed_csv_fails_before_any_training() {
    // One feature column short of the expected schema.
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,b,c,d,label").unwrap();
    writeln!(file, "1.0,2.0,3.0,4.0,Neutral").unwrap();

    let config = BenchConfig::default();
    let loader = DatasetLoader::new().with_expected_features(config.n_features);
    let err = loader
        .load_csv(file.path().to_str().unwrap(), &config.classes)
        .unwrap_err();

    // The loader rejects the file outright; no dataset and no ranking exist.
    assert!(matches!(
        err,
        BenchError::SchemaMismatch {
            expected: 6,
            actual: 5
        }
    ));
}

#[test]
fn test_non_numeric_feature_fails_load() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "a,b,label").unwrap();
    writeln!(file, "1.0,2.0,Neutral").unwrap();
    writeln!(file, "oops,4.0,Hot").unwrap();

    let config = BenchConfig::default();
    let err = DatasetLoader::new()
        .load_csv(file.path().to_str().unwrap(), &config.classes)
        .unwrap_err();

    assert!(matches!(err, BenchError::DataLoad(_)));
}

#[test]
fn test_bundled_dataset_end_to_end() {
    let config = BenchConfig::default();
    let dataset = DatasetLoader::new()
        .with_expected_features(config.n_features)
        .load_csv("thermal_comfort.csv", &config.classes)
        .unwrap();

    assert_eq!(dataset.n_rows(), 112);
    assert_eq!(dataset.n_features(), 5);
    assert_eq!(dataset.class_counts(), vec![16; 7]);

    let bench = ModelBench::new(config, dataset).unwrap();
    let seed = bench.config().random_state;
    let mut records = bench.evaluate(default_roster(seed)).unwrap();

    assert_eq!(records.len(), 7);
    assert!(
        records[0].accuracy >= 0.6,
        "best model should clear 60% on band-separated data, got {:.2}",
        records[0].accuracy
    );

    let reports = bench.refit_and_predict(&mut records, &probe_samples()).unwrap();
    assert_eq!(reports.len(), 7, "every model should survive the full-data refit");
    for report in &reports {
        assert_eq!(report.predictions.len(), 3);
    }

    // The probes are literal rows of the dataset; a fully grown tree must
    // reproduce their labels exactly after the full-data refit.
    let tree_report = reports
        .iter()
        .find(|r| r.name == "Decision Tree")
        .expect("tree should be in the reports");
    for prediction in &tree_report.predictions {
        assert_eq!(prediction.predicted, prediction.expected);
    }
}
