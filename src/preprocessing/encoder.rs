//! One-hot encoding with a dropped reference category

use crate::config::CategoricalFeature;
use crate::error::{BikeTreeError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Fitted state for one categorical column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnEncoding {
    column: String,
    /// Distinct categories in sorted order
    categories: Vec<String>,
    /// Position of the reference category in `categories`
    drop_idx: usize,
    /// category -> position in `categories`
    index: HashMap<String, usize>,
}

impl ColumnEncoding {
    /// Number of indicator columns produced
    fn width(&self) -> usize {
        self.categories.len() - 1
    }

    /// Output column offset within this block, None for the reference
    fn slot(&self, category_idx: usize) -> Option<usize> {
        match category_idx.cmp(&self.drop_idx) {
            std::cmp::Ordering::Less => Some(category_idx),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => Some(category_idx - 1),
        }
    }
}

/// One-hot encoder producing one indicator column per non-reference category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    features: Vec<CategoricalFeature>,
    encodings: Vec<ColumnEncoding>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create a new encoder for the given columns
    pub fn new(features: &[CategoricalFeature]) -> Self {
        Self {
            features: features.to_vec(),
            encodings: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the categories of every configured column
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut encodings = Vec::with_capacity(self.features.len());

        for feature in &self.features {
            let values = string_values(df, &feature.column)?;

            let categories: Vec<String> = values
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<String>>()
                .into_iter()
                .collect();

            let drop_idx = categories
                .iter()
                .position(|c| c == &feature.reference)
                .ok_or_else(|| BikeTreeError::MissingReferenceCategory {
                    column: feature.column.clone(),
                    category: feature.reference.clone(),
                })?;

            let index = categories
                .iter()
                .enumerate()
                .map(|(i, c)| (c.clone(), i))
                .collect();

            tracing::debug!(
                column = %feature.column,
                categories = ?categories,
                reference = %feature.reference,
                "fitted categorical column"
            );

            encodings.push(ColumnEncoding {
                column: feature.column.clone(),
                categories,
                drop_idx,
                index,
            });
        }

        self.encodings = encodings;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode the configured columns into a 0/1 matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(BikeTreeError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut out = Array2::<f64>::zeros((n_rows, self.n_output_columns()));

        let mut offset = 0;
        for encoding in &self.encodings {
            let values = string_values(df, &encoding.column)?;

            for (row, value) in values.iter().enumerate() {
                let idx = *encoding.index.get(*value).ok_or_else(|| {
                    BikeTreeError::UnknownCategory {
                        column: encoding.column.clone(),
                        value: value.to_string(),
                    }
                })?;

                if let Some(slot) = encoding.slot(idx) {
                    out[[row, offset + slot]] = 1.0;
                }
            }

            offset += encoding.width();
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Names of the produced columns: the category lowercased, spaces as `_`
    pub fn feature_names(&self) -> Vec<String> {
        self.encodings
            .iter()
            .flat_map(|enc| {
                enc.categories
                    .iter()
                    .enumerate()
                    .filter(move |(i, _)| *i != enc.drop_idx)
                    .map(|(_, c)| category_feature_name(c))
            })
            .collect()
    }

    /// Sorted categories learned for a column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.encodings
            .iter()
            .find(|e| e.column == column)
            .map(|e| e.categories.as_slice())
    }

    /// Columns this encoder consumes
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.column.as_str())
    }

    /// Total number of indicator columns
    pub fn n_output_columns(&self) -> usize {
        self.encodings.iter().map(|e| e.width()).sum()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

fn category_feature_name(category: &str) -> String {
    category.to_lowercase().replace(' ', "_")
}

fn string_values<'a>(df: &'a DataFrame, column: &str) -> Result<Vec<&'a str>> {
    let col = df
        .column(column)
        .map_err(|_| BikeTreeError::FeatureNotFound(column.to_string()))?;

    let ca = col.str().map_err(|_| {
        BikeTreeError::DataError(format!(
            "categorical column '{}' must be text, got {}",
            column,
            col.dtype()
        ))
    })?;

    ca.into_iter()
        .map(|v| {
            v.ok_or_else(|| BikeTreeError::MissingValue {
                column: column.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_df() -> DataFrame {
        df!(
            "season" => &["WINTER", "SPRING", "SUMMER", "FALL", "WINTER"],
            "weathersit" => &["GOOD", "MISTY", "GOOD", "RAIN/SNOW/STORM", "MISTY"],
            "workingday" => &[
                "NO WORKING DAY",
                "WORKING DAY",
                "WORKING DAY",
                "WORKING DAY",
                "NO WORKING DAY"
            ]
        )
        .unwrap()
    }

    fn features() -> Vec<CategoricalFeature> {
        vec![
            CategoricalFeature::new("season", "WINTER"),
            CategoricalFeature::new("weathersit", "GOOD"),
            CategoricalFeature::new("workingday", "NO WORKING DAY"),
        ]
    }

    #[test]
    fn test_feature_names_sorted_without_reference() {
        let mut encoder = OneHotEncoder::new(&features());
        encoder.fit(&weather_df()).unwrap();

        assert_eq!(
            encoder.feature_names(),
            vec!["fall", "spring", "summer", "misty", "rain/snow/storm", "working_day"]
        );
        assert_eq!(encoder.n_output_columns(), 6);
        assert_eq!(
            encoder.categories("season").unwrap(),
            &["FALL", "SPRING", "SUMMER", "WINTER"]
        );
    }

    #[test]
    fn test_transform_indicators() {
        let mut encoder = OneHotEncoder::new(&features());
        let x = encoder.fit_transform(&weather_df()).unwrap();

        assert_eq!(x.dim(), (5, 6));
        // WINTER / GOOD / NO WORKING DAY is the all-reference row
        assert!(x.row(0).iter().all(|&v| v == 0.0));
        // SPRING, MISTY, WORKING DAY
        assert_eq!(x.row(1).to_vec(), vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        // FALL, RAIN/SNOW/STORM, WORKING DAY
        assert_eq!(x.row(3).to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0]);

        for row in x.rows() {
            let season_sum: f64 = row.iter().take(3).sum();
            assert!(season_sum <= 1.0);
        }
    }

    #[test]
    fn test_missing_reference_category() {
        let df = df!("holiday" => &["NO HOLIDAY", "NO HOLIDAY"]).unwrap();
        let mut encoder = OneHotEncoder::new(&[CategoricalFeature::new("holiday", "HOLIDAY")]);

        let result = encoder.fit(&df);
        assert!(matches!(
            result,
            Err(BikeTreeError::MissingReferenceCategory { ref column, ref category })
                if column == "holiday" && category == "HOLIDAY"
        ));
    }

    #[test]
    fn test_unknown_category_at_transform() {
        let mut encoder = OneHotEncoder::new(&[CategoricalFeature::new("season", "WINTER")]);
        encoder.fit(&df!("season" => &["WINTER", "FALL"]).unwrap()).unwrap();

        let result = encoder.transform(&df!("season" => &["SPRING"]).unwrap());
        assert!(matches!(
            result,
            Err(BikeTreeError::UnknownCategory { ref value, .. }) if value == "SPRING"
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let encoder = OneHotEncoder::new(&features());
        assert!(matches!(
            encoder.transform(&weather_df()),
            Err(BikeTreeError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_non_text_column() {
        let df = df!("season" => &[1i64, 2, 3]).unwrap();
        let mut encoder = OneHotEncoder::new(&[CategoricalFeature::new("season", "1")]);
        assert!(matches!(encoder.fit(&df), Err(BikeTreeError::DataError(_))));
    }

    #[test]
    fn test_null_category() {
        let df = df!("season" => &[Some("WINTER"), None]).unwrap();
        let mut encoder = OneHotEncoder::new(&[CategoricalFeature::new("season", "WINTER")]);
        assert!(matches!(
            encoder.fit(&df),
            Err(BikeTreeError::MissingValue { .. })
        ));
    }

    #[test]
    fn test_single_category_column_produces_no_output() {
        let df = df!("holiday" => &["NO HOLIDAY", "NO HOLIDAY"]).unwrap();
        let mut encoder =
            OneHotEncoder::new(&[CategoricalFeature::new("holiday", "NO HOLIDAY")]);
        let x = encoder.fit_transform(&df).unwrap();
        assert_eq!(x.dim(), (2, 0));
        assert!(encoder.feature_names().is_empty());
    }
}
