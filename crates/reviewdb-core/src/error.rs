//! Core error types.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Document store error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Relational source error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A source row could not be mapped to a document.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// A search pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A store could not be opened.
    #[error("connection error: {0}")]
    Connection(String),

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised while turning a joined source row into a review document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A required column was NULL or absent.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// A column held a value of the wrong shape.
    #[error("invalid value in `{column}`: {reason}")]
    InvalidValue {
        column: &'static str,
        reason: String,
    },

    /// The join statement does not declare the expected columns.
    #[error("row schema mismatch: expected [{}], found [{}]", expected.join(", "), found.join(", "))]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl MappingError {
    pub(crate) fn invalid(column: &'static str, reason: impl Into<String>) -> Self {
        MappingError::InvalidValue {
            column,
            reason: reason.into(),
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
