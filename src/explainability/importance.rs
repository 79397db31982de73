//! Named impurity-based feature importances

use crate::error::{BikeTreeError, Result};
use crate::training::Model;
use serde::{Deserialize, Serialize};

/// Importance of a single feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub feature_name: String,
    /// Share of the total impurity decrease attributed to this feature
    pub importance: f64,
}

/// Importances of every feature, in feature-table order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportances {
    entries: Vec<FeatureImportance>,
}

impl FeatureImportances {
    /// Pair a fitted model's importances with the feature names
    pub fn from_model(model: &dyn Model, feature_names: &[String]) -> Result<Self> {
        let values = model
            .feature_importances()
            .ok_or(BikeTreeError::ModelNotFitted)?;

        if values.len() != feature_names.len() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("{} feature names", values.len()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        let entries = feature_names
            .iter()
            .zip(values.iter())
            .map(|(name, &importance)| FeatureImportance {
                feature_name: name.clone(),
                importance,
            })
            .collect();

        Ok(Self { entries })
    }

    /// Entries in feature order
    pub fn iter(&self) -> impl Iterator<Item = &FeatureImportance> {
        self.entries.iter()
    }

    /// Importance of a named feature
    pub fn get(&self, feature_name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.feature_name == feature_name)
            .map(|e| e.importance)
    }

    /// Entries by importance, descending; equal values keep feature order
    pub fn sorted(&self) -> Vec<&FeatureImportance> {
        let mut sorted: Vec<&FeatureImportance> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        sorted
    }

    /// Get top k features
    pub fn top_k(&self, k: usize) -> Vec<&FeatureImportance> {
        self.sorted().into_iter().take(k).collect()
    }

    /// Features the tree actually split on
    pub fn non_zero(&self) -> Vec<&FeatureImportance> {
        self.entries.iter().filter(|e| e.importance > 0.0).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.feature_name.clone()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.importance).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
