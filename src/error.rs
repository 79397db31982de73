//! Error types for the bike-rental tree analysis

use thiserror::Error;

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, BikeTreeError>;

/// Main error type for the analysis
#[derive(Error, Debug)]
pub enum BikeTreeError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Missing value in column '{column}'")]
    MissingValue { column: String },

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Reference category '{category}' not present in column '{column}'")]
    MissingReferenceCategory { column: String, category: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for BikeTreeError {
    fn from(err: polars::error::PolarsError) -> Self {
        BikeTreeError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BikeTreeError {
    fn from(err: serde_json::Error) -> Self {
        BikeTreeError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BikeTreeError {
    fn from(err: ndarray::ShapeError) -> Self {
        BikeTreeError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BikeTreeError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_category_error_display() {
        let err = BikeTreeError::UnknownCategory {
            column: "season".to_string(),
            value: "MONSOON".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown category 'MONSOON' in column 'season'");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BikeTreeError = io_err.into();
        assert!(matches!(err, BikeTreeError::IoError(_)));
    }
}
