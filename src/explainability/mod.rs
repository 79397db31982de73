//! Model explainability module
//!
//! Provides model interpretation through impurity-based feature importances
//! named after the columns of the feature table.

mod importance;

pub use importance::{FeatureImportance, FeatureImportances};
