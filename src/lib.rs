//! bikeshare-tree - Decision-tree explanation of daily bike-rental counts
//!
//! Loads the daily rental table, one-hot encodes its categorical columns
//! against fixed reference categories, fits a shallow squared-error
//! regression tree on the rental count and renders two SVG plots: the tree
//! structure and the impurity-based feature importances.
//!
//! # Modules
//!
//! - [`config`] - Analysis configuration (columns, tree hyperparameters, outputs)
//! - [`utils`] - CSV loading and column extraction
//! - [`preprocessing`] - One-hot encoding and feature table assembly
//! - [`training`] - Decision tree regressor and regression metrics
//! - [`explainability`] - Named feature importances
//! - [`visualization`] - SVG tree diagram and bar chart
//! - [`pipeline`] - End-to-end analysis run
//! - [`report`] - Terminal summary

// Core error handling
pub mod error;
pub mod config;

// Data and modelling
pub mod utils;
pub mod preprocessing;
pub mod training;
pub mod explainability;

// Output
pub mod visualization;
pub mod pipeline;
pub mod report;

pub use error::{BikeTreeError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{BikeTreeError, Result};

    // Configuration
    pub use crate::config::{AnalysisConfig, CategoricalFeature, TreeConfig};

    // Data
    pub use crate::utils::DataLoader;
    pub use crate::preprocessing::{FeatureTable, OneHotEncoder};

    // Training
    pub use crate::training::{DecisionTreeRegressor, Model, RegressionMetrics, TreeNode};

    // Explainability
    pub use crate::explainability::{FeatureImportance, FeatureImportances};

    // Visualization
    pub use crate::visualization::{BarChart, SvgDocument, TreePlot};

    // Pipeline
    pub use crate::pipeline::{Analysis, AnalysisReport, FittedAnalysis};
}
