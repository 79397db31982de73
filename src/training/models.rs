//! Shared model trait and regression metrics

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Goodness-of-fit metrics for a regressor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean squared error
    pub mse: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Mean absolute error
    pub mae: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Number of samples scored
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::default();
        }

        let n = n_samples as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();

        // Constant target: perfect predictions score 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples,
        }
    }
}

/// Trait for fitted regressors
pub trait Model: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// R² on the given data
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        Ok(RegressionMetrics::compute(y, &y_pred).r2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regression_metrics() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.1, 2.9, 4.2, 4.8];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred);

        assert!((metrics.mse - 0.022).abs() < 1e-9);
        assert!((metrics.rmse - 0.022f64.sqrt()).abs() < 1e-9);
        assert!((metrics.mae - 0.14).abs() < 1e-9);
        assert!((metrics.r2 - 0.989).abs() < 1e-9);
        assert_eq!(metrics.n_samples, 5);
    }

    #[test]
    fn test_constant_target_r2() {
        let y = array![3.0, 3.0, 3.0];
        assert_eq!(RegressionMetrics::compute(&y, &y).r2, 1.0);
        assert_eq!(RegressionMetrics::compute(&y, &array![3.0, 3.0, 4.0]).r2, 0.0);
    }

    #[test]
    fn test_empty_metrics() {
        let empty = Array1::<f64>::zeros(0);
        assert_eq!(RegressionMetrics::compute(&empty, &empty), RegressionMetrics::default());
    }
}
