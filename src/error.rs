//! Error types for the autoforecast crate

use thiserror::Error;

/// Crate-wide error type.
///
/// Failures scoped to a single trial or a single model are not raised
/// through this type during a run; they are recorded as sentinel scores
/// or report entries so one bad unit of work never aborts the rest.
#[derive(Error, Debug)]
pub enum AutoForecastError {
    #[error("Invalid search space: {0}")]
    InvalidSearchSpace(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Search for '{0}' produced no successful trials")]
    SearchExhausted(String),

    #[error("Model '{0}' not found in registry")]
    ModelNotFound(String),

    #[error("Registry load error: {0}")]
    RegistryLoad(String),

    #[error("Registry save error: {0}")]
    RegistrySave(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AutoForecastError>;
