//! CLI error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] reviewdb_core::Error),

    #[error(transparent)]
    Bench(#[from] reviewdb_bench::BenchError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
