//! Data loading utilities

use crate::error::{BikeTreeError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;

/// CSV loader for the daily observation table
pub struct DataLoader {
    /// Rows scanned to infer column types (None = whole file)
    infer_schema_length: Option<usize>,
    /// Field separator
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(1000),
            separator: b',',
        }
    }

    /// Set the number of rows used for schema inference
    pub fn with_infer_schema_length(mut self, n: Option<usize>) -> Self {
        self.infer_schema_length = n;
        self
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();

        let file = File::open(path)?;
        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| BikeTreeError::DataError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed = ?start.elapsed(),
            "loaded csv"
        );

        Ok(df)
    }
}

/// Remove the named columns; every name must exist
pub fn drop_columns(df: &DataFrame, names: &[String]) -> Result<DataFrame> {
    let mut result = df.clone();
    for name in names {
        if result.column(name).is_err() {
            return Err(BikeTreeError::FeatureNotFound(name.clone()));
        }
        result = result.drop(name)?;
    }
    Ok(result)
}

/// Separate the target column from the features
///
/// Returns the remaining columns in input order and the target cast
/// to `f64`.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>)> {
    let column = df
        .column(target)
        .map_err(|_| BikeTreeError::FeatureNotFound(target.to_string()))?;

    let y = column_to_vec(column, target)?;
    let features = df.drop(target)?;

    Ok((features, Array1::from_vec(y)))
}

/// Extract named numeric columns into a row-major `Array2<f64>`
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| BikeTreeError::FeatureNotFound(col_name.clone()))?;
            column_to_vec(column, col_name)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

fn column_to_vec(column: &Column, name: &str) -> Result<Vec<f64>> {
    if matches!(column.dtype(), DataType::String) {
        return Err(BikeTreeError::DataError(format!(
            "column '{}' is not numeric (dtype {})",
            name,
            column.dtype()
        )));
    }

    let as_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| BikeTreeError::DataError(format!("column '{}': {}", name, e)))?;

    as_f64
        .f64()
        .map_err(|e| BikeTreeError::DataError(e.to_string()))?
        .into_iter()
        .map(|v| {
            v.ok_or_else(|| BikeTreeError::MissingValue {
                column: name.to_string(),
            })
        })
        .collect()
}
