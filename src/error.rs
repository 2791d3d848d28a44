//! Error types for multimodal SVM experiments

use thiserror::Error;

/// Result type alias for experiment operations
pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Main error type for the experiment driver
#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error("Invalid modalities: at least one of use_target_text / use_target_audio must be set")]
    InvalidModalities,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Missing metric: fold {fold} has no \"{key}\" entry")]
    MissingMetric { fold: usize, key: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ExperimentError {
    /// Row-count mismatch between two matrices that must be aligned.
    pub fn row_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        ExperimentError::ShapeError {
            expected: format!("{} rows ({})", expected, what),
            actual: format!("{} rows", actual),
        }
    }
}

impl From<serde_json::Error> for ExperimentError {
    fn from(err: serde_json::Error) -> Self {
        ExperimentError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ExperimentError {
    fn from(err: ndarray::ShapeError) -> Self {
        ExperimentError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
