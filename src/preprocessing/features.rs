//! Assembly of the numeric feature table

use super::OneHotEncoder;
use crate::config::AnalysisConfig;
use crate::error::{BikeTreeError, Result};
use crate::utils::data_loader::{columns_to_array2, drop_columns, split_target};
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use std::collections::HashSet;

/// Encoded features, their names, and the regression target
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// Row-major feature matrix (rows x features)
    pub x: Array2<f64>,
    /// Target values, one per row
    pub y: Array1<f64>,
    /// Column names of `x`, numeric columns first, then indicators
    pub feature_names: Vec<String>,
    /// Encoder fitted on the categorical columns
    pub encoder: OneHotEncoder,
}

impl FeatureTable {
    /// Drop, split, encode and concatenate according to `config`
    pub fn build(df: &DataFrame, config: &AnalysisConfig) -> Result<Self> {
        let reduced = drop_columns(df, &config.dropped_columns)?;
        let (features, y) = split_target(&reduced, &config.target_column)?;

        let categorical: HashSet<&str> = config
            .categorical_features
            .iter()
            .map(|f| f.column.as_str())
            .collect();

        let numeric_names: Vec<String> = features
            .get_column_names()
            .into_iter()
            .filter(|name| !categorical.contains(name.as_str()))
            .map(|name| name.to_string())
            .collect();

        let x_numeric = columns_to_array2(&features, &numeric_names)?;

        let mut encoder = OneHotEncoder::new(&config.categorical_features);
        let x_encoded = encoder.fit_transform(&features)?;

        let x = concatenate(Axis(1), &[x_numeric.view(), x_encoded.view()])?;

        let mut feature_names = numeric_names;
        feature_names.extend(encoder.feature_names());

        let mut seen = HashSet::new();
        if let Some(dup) = feature_names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(BikeTreeError::DataError(format!(
                "duplicate feature name '{}' after encoding",
                dup
            )));
        }

        tracing::info!(
            rows = x.nrows(),
            numeric = x_numeric.ncols(),
            encoded = x_encoded.ncols(),
            "built feature table"
        );

        let table = Self {
            x,
            y,
            feature_names,
            encoder,
        };
        table.check_shape()?;
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Values of one named feature
    pub fn column(&self, name: &str) -> Option<Array1<f64>> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.x.column(idx).to_owned())
    }

    fn check_shape(&self) -> Result<()> {
        if self.feature_names.len() != self.x.ncols() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("{} feature names", self.x.ncols()),
                actual: format!("{} feature names", self.feature_names.len()),
            });
        }
        if self.y.len() != self.x.nrows() {
            return Err(BikeTreeError::ShapeError {
                expected: format!("y length = {}", self.x.nrows()),
                actual: format!("y length = {}", self.y.len()),
            });
        }
        Ok(())
    }
}
