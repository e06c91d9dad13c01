//! Thermal comfort model bench - entry point
//!
//! Trains the default classifier roster on `thermal_comfort.csv`, prints the
//! validation ranking, then refits every model on the full dataset and runs
//! three reference samples through each of them.

use std::time::Instant;

use thermobench::bench::{
    default_roster, prediction_report, ranking_report, sample_report, ModelBench, Sample,
};
use thermobench::config::BenchConfig;
use thermobench::data::loader::DatasetLoader;

const DATA_PATH: &str = "thermal_comfort.csv";

/// Probe measurements with known sensation labels, used to sanity-check the
/// refitted models against points they trained on.
fn reference_samples() -> Vec<Sample> {
    vec![
        Sample::new(vec![0.1, 50.0, 1.0, 0.61, 23.0], "Slightly Cool"),
        Sample::new(vec![0.1, 60.0, 1.0, 0.61, 26.0], "Neutral"),
        Sample::new(vec![0.1, 76.0, 1.0, 0.61, 28.0], "Slightly Warm"),
    ]
}

fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thermobench=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let started = Instant::now();

    let config = BenchConfig::default();
    let dataset = DatasetLoader::new()
        .with_expected_features(config.n_features)
        .load_csv(DATA_PATH, &config.classes)?;

    let bench = ModelBench::new(config, dataset)?;
    let seed = bench.config().random_state;
    let mut records = bench.evaluate(default_roster(seed))?;

    println!("{}", ranking_report(&records));

    let samples = reference_samples();
    println!("{}", sample_report(&samples, &bench.dataset().feature_names));

    let reports = bench.refit_and_predict(&mut records, &samples)?;
    print!("{}", prediction_report(&reports));

    println!("Elapsed time: {:.2} seconds.", started.elapsed().as_secs_f64());
    Ok(())
}
