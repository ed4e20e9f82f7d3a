//! reviewdb benchmark suite
//!
//! Compares the relational catalog (SQLite) against the sled document store on
//! an equivalent review workload.
//!
//! # Phases
//!
//! - **Insertion**: the whole generated workload, one batch per backend
//! - **Reading**: lookups of all reviews by one user
//! - **Search**: case-insensitive text search, capped at a result limit
//!
//! Each phase runs against the baseline and then the candidate backend, never
//! both at once.

pub mod backends;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod report;
pub mod workload;

pub use backends::{BackendAdapter, DocumentBackend, RatingDistribution, SqliteBackend};
pub use config::BenchConfig;
pub use error::{BackendError, BenchError};
pub use fixtures::{seed_catalog, SeedConfig, SeedStats};
pub use harness::{BenchmarkHarness, HarnessState, Phase, PhaseSamples};
pub use report::{percent_difference, BackendTiming, BenchReport, PhaseReport};
pub use workload::{fold_comments, FlatReview, ReviewPair, RichReview, WorkloadGenerator};
