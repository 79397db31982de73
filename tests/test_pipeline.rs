//! Integration test: full analysis run on the bike-rental sample

use bikeshare_tree::config::{AnalysisConfig, CategoricalFeature};
use bikeshare_tree::error::BikeTreeError;
use bikeshare_tree::pipeline::Analysis;
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/bike_sample.csv")
}

fn config(out: &Path) -> AnalysisConfig {
    AnalysisConfig::new()
        .with_data_path(fixture())
        .with_output_dir(out)
}

#[test]
fn test_run_writes_both_plots() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = Analysis::new(config(dir.path())).unwrap();

    let report = analysis.run().unwrap();

    assert_eq!(report.tree_plot_path, dir.path().join("decision_tree.svg"));
    assert_eq!(report.importance_plot_path, dir.path().join("feature_importance.svg"));

    for path in [&report.tree_plot_path, &report.importance_plot_path] {
        let metadata = std::fs::metadata(path).unwrap();
        assert!(metadata.len() > 0, "{} should not be empty", path.display());
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.starts_with("<?xml"));
        assert!(contents.trim_end().ends_with("</svg>"));
    }
}

#[test]
fn test_report_feature_layout() {
    let dir = tempfile::tempdir().unwrap();
    let report = Analysis::new(config(dir.path())).unwrap().run().unwrap();

    assert_eq!(report.n_rows, 32);
    assert_eq!(
        report.feature_names,
        vec![
            "temp",
            "hum",
            "windspeed",
            "days_since_2011",
            "fall",
            "spring",
            "summer",
            "misty",
            "rain/snow/storm",
            "holiday",
            "working_day",
        ]
    );
    assert_eq!(report.importances.names(), report.feature_names);
}

#[test]
fn test_depth_and_importances() {
    let dir = tempfile::tempdir().unwrap();
    let report = Analysis::new(config(dir.path())).unwrap().run().unwrap();

    assert!(report.tree_depth <= 2);
    assert!(report.n_leaves <= 4);
    assert!(report.n_leaves >= 2);

    let values = report.importances.values();
    assert!(values.iter().all(|&v| v >= 0.0));
    assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(!report.importances.non_zero().is_empty());
    assert!(report.metrics.r2 > 0.0);
}

#[test]
fn test_tree_plot_shows_root_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let report = Analysis::new(config(dir.path())).unwrap().run().unwrap();

    let svg = std::fs::read_to_string(&report.tree_plot_path).unwrap();
    assert!(svg.contains(">samples = 32</text>"));
    assert!(svg.contains("squared_error = "));
    assert!(svg.contains(" &lt;= "));

    let chart = std::fs::read_to_string(&report.importance_plot_path).unwrap();
    for name in &report.feature_names {
        assert!(chart.contains(&format!(">{}</text>", name)), "missing label {}", name);
    }
}

#[test]
fn test_config_file_overrides_depth() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bikeshare-tree.json");
    config(dir.path()).with_max_depth(1).to_json_file(&config_path).unwrap();

    let loaded = AnalysisConfig::load_or_default(&config_path).unwrap();
    let report = Analysis::new(loaded).unwrap().run().unwrap();

    assert_eq!(report.tree_depth, 1);
    assert_eq!(report.n_leaves, 2);
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = Analysis::new(
        AnalysisConfig::new()
            .with_data_path(dir.path().join("missing.csv"))
            .with_output_dir(dir.path()),
    )
    .unwrap();

    assert!(matches!(analysis.run(), Err(BikeTreeError::IoError(_))));
    assert!(!dir.path().join("decision_tree.svg").exists());
}

#[test]
fn test_missing_reference_category() {
    let dir = tempfile::tempdir().unwrap();
    let mut features = AnalysisConfig::default().categorical_features;
    features[0] = CategoricalFeature::new("season", "MONSOON");

    let analysis = Analysis::new(config(dir.path()).with_categorical_features(features)).unwrap();

    assert!(matches!(
        analysis.run(),
        Err(BikeTreeError::MissingReferenceCategory { ref column, .. }) if column == "season"
    ));
}

#[test]
fn test_unknown_dropped_column() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = Analysis::new(
        config(dir.path()).with_dropped_columns(vec!["yr".to_string(), "registered".to_string()]),
    )
    .unwrap();

    assert!(matches!(
        analysis.run(),
        Err(BikeTreeError::FeatureNotFound(ref c)) if c == "registered"
    ));
}
