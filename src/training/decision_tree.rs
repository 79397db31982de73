//! Decision tree regressor

use super::models::{Model, RegressionMetrics};
use crate::config::TreeConfig;
use crate::error::{BikeTreeError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Nodes with impurity at or below this are not split further
const IMPURITY_EPSILON: f64 = 1e-12;

/// Consecutive sorted values closer than this are treated as equal
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
        impurity: f64,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        value: f64,
        n_samples: usize,
        impurity: f64,
    },
}

impl TreeNode {
    /// Mean target of the samples reaching this node
    pub fn value(&self) -> f64 {
        match self {
            TreeNode::Leaf { value, .. } | TreeNode::Split { value, .. } => *value,
        }
    }

    pub fn n_samples(&self) -> usize {
        match self {
            TreeNode::Leaf { n_samples, .. } | TreeNode::Split { n_samples, .. } => *n_samples,
        }
    }

    /// Mean squared error of the samples reaching this node
    pub fn impurity(&self) -> f64 {
        match self {
            TreeNode::Leaf { impurity, .. } | TreeNode::Split { impurity, .. } => *impurity,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree grown with the squared-error criterion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Number of features seen during fit
    n_features: usize,
    /// Normalized impurity-decrease importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Create an unbounded tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Create a tree from configured hyperparameters
    pub fn from_config(config: &TreeConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
            ..Self::new()
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 {
            return Err(BikeTreeError::InvalidParameter {
                name: "n_samples".to_string(),
                value: "0".to_string(),
                reason: "cannot fit a tree on an empty table".to_string(),
            });
        }

        if self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(BikeTreeError::InvalidParameter {
                name: "min_samples".to_string(),
                value: format!("split={}, leaf={}", self.min_samples_split, self.min_samples_leaf),
                reason: "min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            });
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(BikeTreeError::DataError(
                "input contains NaN or infinite values".to_string(),
            ));
        }

        self.n_features = n_features;

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build_tree(x, y, indices, 0, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }

        tracing::debug!(
            n_samples,
            n_features,
            depth = node_depth(&root),
            leaves = count_leaves(&root),
            "fitted decision tree"
        );

        self.root = Some(root);
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let targets: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let (value, impurity) = mean_and_mse(&targets);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= IMPURITY_EPSILON;

        let split = if should_stop {
            None
        } else {
            self.find_best_split(x, y, &indices, value, impurity)
        };

        let Some(split) = split else {
            return TreeNode::Leaf {
                value,
                n_samples,
                impurity,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        let left = self.build_tree(x, y, left_indices, depth + 1, importances);
        let right = self.build_tree(x, y, right_indices, depth + 1, importances);

        importances[split.feature_idx] += n_samples as f64 * impurity
            - left.n_samples() as f64 * left.impurity()
            - right.n_samples() as f64 * right.impurity();

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
            value,
            n_samples,
            impurity,
        }
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        node_mean: f64,
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        // Features are scanned in parallel; the reduction below runs in feature
        // order so ties always go to the lowest index.
        let per_feature: Vec<Option<SplitCandidate>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let column = x.column(feature_idx);
                self.best_split_for_feature(column, y, indices, node_mean, parent_impurity)
                    .map(|(threshold, gain)| SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    })
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    /// Sweep the sorted values of one feature with running sums
    ///
    /// Targets are centred on the node mean so the running sums stay small
    /// relative to the spread, whatever the magnitude of the target.
    fn best_split_for_feature(
        &self,
        column: ArrayView1<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        node_mean: f64,
        parent_impurity: f64,
    ) -> Option<(f64, f64)> {
        let n = indices.len();
        let min_gain = IMPURITY_EPSILON * parent_impurity.max(node_mean * node_mean).max(1.0);
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (column[i], y[i] - node_mean))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq_sum: f64 = pairs.iter().map(|p| p.1 * p.1).sum();

        let mut left_sum = 0.0;
        let mut left_sq_sum = 0.0;
        let mut best: Option<(f64, f64)> = None;

        for pos in 1..n {
            let (prev_value, prev_y) = pairs[pos - 1];
            left_sum += prev_y;
            left_sq_sum += prev_y * prev_y;

            let value = pairs[pos].0;
            if value <= prev_value + FEATURE_THRESHOLD {
                continue;
            }

            let left_count = pos;
            let right_count = n - pos;
            if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                continue;
            }

            let left_impurity = variance(left_count, left_sum, left_sq_sum);
            let right_impurity = variance(
                right_count,
                total_sum - left_sum,
                total_sq_sum - left_sq_sum,
            );
            let weighted = (left_count as f64 * left_impurity
                + right_count as f64 * right_impurity)
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > min_gain && best.map_or(true, |(_, g)| gain > g) {
                let mut threshold = (prev_value + value) / 2.0;
                // Midpoint can round up to the right value
                if threshold >= value || !threshold.is_finite() {
                    threshold = prev_value;
                }
                best = Some((threshold, gain));
            }
        }

        best
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(BikeTreeError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(BikeTreeError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| predict_sample(root, row))
            .collect())
    }

    /// R² of the predictions on `x` against `y`
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        Ok(self.metrics(x, y)?.r2)
    }

    /// Full regression metrics on `x` against `y`
    pub fn metrics(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<RegressionMetrics> {
        if x.nrows() != y.len() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let y_pred = self.predict(x)?;
        Ok(RegressionMetrics::compute(y, &y_pred))
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Fitted root node
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Number of features seen during fit
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of split levels (a single-leaf tree has depth 0)
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, count_leaves)
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}

impl Model for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTreeRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTreeRegressor::predict(self, x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }

    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        DecisionTreeRegressor::score(self, x, y)
    }
}

fn predict_sample(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn node_depth(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 0,
        TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
    }
}

fn count_leaves(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf { .. } => 1,
        TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
    }
}

/// Mean and two-pass centred variance
fn mean_and_mse(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    // Exact zero for constant targets, whatever rounding the mean picks up
    if values.iter().all(|&v| v == values[0]) {
        return (values[0], 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let mse = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, mse)
}

/// Var = E[X²] - E[X]² over centred running sums, clamped at zero
fn variance(count: usize, sum: f64, sq_sum: f64) -> f64 {
    let n = count as f64;
    (sq_sum / n - (sum / n).powi(2)).max(0.0)
}
