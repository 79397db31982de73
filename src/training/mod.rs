//! Model training module
//!
//! Provides the squared-error regression tree used to explain rental counts,
//! the [`Model`] trait it implements, and regression metrics.

pub mod decision_tree;
mod models;

pub use decision_tree::{DecisionTreeRegressor, TreeNode};
pub use models::{Model, RegressionMetrics};
