//! Analysis configuration
//!
//! Defaults reproduce the bike-rental analysis exactly: the three calendar
//! columns are dropped, `cnt` is the target, four categorical columns are
//! one-hot encoded against a fixed reference category, and a depth-2 tree is
//! fitted. Every field can be overridden from a JSON file.

use crate::error::{BikeTreeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Name of the optional config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bikeshare-tree.json";

/// A categorical column and the category dropped as its reference level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalFeature {
    /// Column name in the input table
    pub column: String,
    /// Category that gets no indicator column
    pub reference: String,
}

impl CategoricalFeature {
    pub fn new(column: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            reference: reference.into(),
        }
    }
}

/// Hyperparameters of the regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in each leaf
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(2),
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Configuration for a full analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Input CSV file
    pub data_path: PathBuf,

    /// Columns removed before anything else
    pub dropped_columns: Vec<String>,

    /// Target column name
    pub target_column: String,

    /// Categorical columns to one-hot encode, in output order
    pub categorical_features: Vec<CategoricalFeature>,

    /// Tree hyperparameters
    pub tree: TreeConfig,

    /// Directory receiving the plot files
    pub output_dir: PathBuf,

    /// File name of the tree diagram
    pub tree_plot_file: String,

    /// File name of the importance bar chart
    pub importance_plot_file: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("../data/bike.csv"),
            dropped_columns: vec!["yr".to_string(), "mnth".to_string(), "weekday".to_string()],
            target_column: "cnt".to_string(),
            categorical_features: vec![
                CategoricalFeature::new("season", "WINTER"),
                CategoricalFeature::new("weathersit", "GOOD"),
                CategoricalFeature::new("holiday", "NO HOLIDAY"),
                CategoricalFeature::new("workingday", "NO WORKING DAY"),
            ],
            tree: TreeConfig::default(),
            output_dir: PathBuf::from("."),
            tree_plot_file: "decision_tree.svg".to_string(),
            importance_plot_file: "feature_importance.svg".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the input file
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Builder method to set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Builder method to set the maximum tree depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.tree.max_depth = Some(depth);
        self
    }

    /// Builder method to replace the dropped columns
    pub fn with_dropped_columns(mut self, columns: Vec<String>) -> Self {
        self.dropped_columns = columns;
        self
    }

    /// Builder method to replace the categorical features
    pub fn with_categorical_features(mut self, features: Vec<CategoricalFeature>) -> Self {
        self.categorical_features = features;
        self
    }

    /// Full path of the tree diagram
    pub fn tree_plot_path(&self) -> PathBuf {
        self.output_dir.join(&self.tree_plot_file)
    }

    /// Full path of the importance chart
    pub fn importance_plot_path(&self) -> PathBuf {
        self.output_dir.join(&self.importance_plot_file)
    }

    /// Read a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Read `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!(path = %path.display(), "loading configuration file");
            Self::from_json_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Check the configuration for values the analysis cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(BikeTreeError::ConfigError(
                "target column must not be empty".to_string(),
            ));
        }

        if self.tree.max_depth == Some(0) {
            return Err(BikeTreeError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.tree.min_samples_split < 2 {
            return Err(BikeTreeError::InvalidParameter {
                name: "min_samples_split".to_string(),
                value: self.tree.min_samples_split.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }

        if self.tree.min_samples_leaf == 0 {
            return Err(BikeTreeError::InvalidParameter {
                name: "min_samples_leaf".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for feature in &self.categorical_features {
            if feature.column == self.target_column {
                return Err(BikeTreeError::ConfigError(format!(
                    "target column '{}' cannot be a categorical feature",
                    feature.column
                )));
            }
            if !seen.insert(feature.column.as_str()) {
                return Err(BikeTreeError::ConfigError(format!(
                    "categorical column '{}' listed twice",
                    feature.column
                )));
            }
        }

        if self.tree_plot_file.is_empty() || self.importance_plot_file.is_empty() {
            return Err(BikeTreeError::ConfigError(
                "plot file names must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.target_column, "cnt");
        assert_eq!(config.dropped_columns, vec!["yr", "mnth", "weekday"]);
        assert_eq!(config.categorical_features.len(), 4);
        assert_eq!(config.categorical_features[3].reference, "NO WORKING DAY");
        assert_eq!(config.tree.max_depth, Some(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = AnalysisConfig::new()
            .with_data_path("data/day.csv")
            .with_output_dir("/tmp/plots")
            .with_max_depth(4);

        assert_eq!(config.data_path, PathBuf::from("data/day.csv"));
        assert_eq!(config.tree.max_depth, Some(4));
        assert_eq!(config.tree_plot_path(), PathBuf::from("/tmp/plots/decision_tree.svg"));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = AnalysisConfig::new().with_max_depth(0);
        assert!(matches!(
            config.validate(),
            Err(BikeTreeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_small_min_samples_split() {
        let mut config = AnalysisConfig::new();
        config.tree.min_samples_split = 1;
        assert!(matches!(
            config.validate(),
            Err(BikeTreeError::InvalidParameter { ref name, .. }) if name == "min_samples_split"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_min_samples_leaf() {
        let mut config = AnalysisConfig::new();
        config.tree.min_samples_leaf = 0;
        assert!(matches!(
            config.validate(),
            Err(BikeTreeError::InvalidParameter { ref name, .. }) if name == "min_samples_leaf"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_target() {
        let mut config = AnalysisConfig::new();
        config.target_column = "  ".to_string();
        assert!(matches!(config.validate(), Err(BikeTreeError::ConfigError(_))));
    }

    #[test]
    fn test_validate_rejects_categorical_target() {
        let config = AnalysisConfig::new()
            .with_categorical_features(vec![CategoricalFeature::new("cnt", "0")]);
        assert!(matches!(
            config.validate(),
            Err(BikeTreeError::ConfigError(ref msg)) if msg.contains("'cnt'")
        ));
    }

    #[test]
    fn test_validate_rejects_empty_plot_name() {
        let mut config = AnalysisConfig::new();
        config.importance_plot_file.clear();
        assert!(matches!(config.validate(), Err(BikeTreeError::ConfigError(_))));
    }

    #[test]
    fn test_from_json_file_validates() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"tree": {"min_samples_leaf": 0}}"#).unwrap();
        assert!(matches!(
            AnalysisConfig::from_json_file(file.path()),
            Err(BikeTreeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_categorical() {
        let config = AnalysisConfig::new().with_categorical_features(vec![
            CategoricalFeature::new("season", "WINTER"),
            CategoricalFeature::new("season", "FALL"),
        ]);
        assert!(matches!(config.validate(), Err(BikeTreeError::ConfigError(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"tree": {"max_depth": 3}, "output_dir": "out"}"#).unwrap();
        assert_eq!(config.tree.max_depth, Some(3));
        assert_eq!(config.tree.min_samples_split, 2);
        assert_eq!(config.target_column, "cnt");
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_json_file_round_trip() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AnalysisConfig::new().with_max_depth(5);
        config.to_json_file(file.path()).unwrap();

        let loaded = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::load_or_default(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
