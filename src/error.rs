//! Error types for the qurro library.

use thiserror::Error;

/// Main error type for the library.
///
/// Every data problem the reconciliation pipeline can detect is reported as
/// [`QurroError::Validation`] with a message meant to be shown verbatim.
#[derive(Error, Debug)]
pub enum QurroError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Validation(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QurroError {
    /// Shorthand for building a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        QurroError::Validation(msg.into())
    }

    /// True if the input data (rather than the environment) was at fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, QurroError::Validation(_))
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, QurroError>;
