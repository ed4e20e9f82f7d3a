//! Benchmark error types.

use thiserror::Error;

use crate::harness::Phase;

/// A single timed backend operation failed.
///
/// The harness drops the sample and counts the failure.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Relational backend error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document store error.
    #[error("document store error: {0}")]
    Store(#[from] reviewdb_core::Error),

    /// The backend returned something the adapter could not interpret.
    #[error("unexpected backend data: {0}")]
    Unexpected(String),
}

/// Errors that abort a benchmark run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// A backend could not be reached at startup.
    #[error("connection error: {0}")]
    Connection(String),

    /// Every sample of a phase failed for one backend.
    #[error("no successful samples in {phase} phase for backend {backend}")]
    NoSamples { phase: Phase, backend: String },

    /// No user or book ids to build a workload from.
    #[error("candidate snapshot has no users or no books")]
    EmptyCandidates,

    /// Error from the core crate outside a timed operation.
    #[error(transparent)]
    Core(#[from] reviewdb_core::Error),
}

impl BenchError {
    /// Lift a core error raised while acquiring a backend.
    pub fn connection(err: reviewdb_core::Error) -> Self {
        match err {
            reviewdb_core::Error::Connection(msg) => BenchError::Connection(msg),
            other => BenchError::Connection(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
