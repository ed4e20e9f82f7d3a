//! Storage backends under comparison.
//!
//! Both backends run the same operation set over the same workload so the
//! harness can compare their timings.

pub mod document;
pub mod sqlite;

use std::time::Duration;

use regex::{Regex, RegexBuilder};

use crate::error::BackendError;
use crate::workload::ReviewPair;

pub use document::DocumentBackend;
pub use sqlite::SqliteBackend;

/// Count of stored reviews per rating, index 0 holding rating 1.
pub type RatingDistribution = [usize; 5];

/// Uniform operation set over one storage engine.
///
/// Timed operations return the wall-clock time spent in the backend call.
/// Preparing inputs (encoding documents, building patterns) happens before
/// the clock starts.
pub trait BackendAdapter {
    /// Name used in reports.
    fn name(&self) -> &str;

    /// Store every record of the workload.
    fn insert_batch(&mut self, records: &[ReviewPair]) -> Result<Duration, BackendError>;

    /// Fetch all reviews written by `user_id`.
    fn query_by_key(&mut self, user_id: i64) -> Result<Duration, BackendError>;

    /// Case-insensitive search for `term`, returning at most `limit` reviews.
    fn text_search(&mut self, term: &str, limit: usize) -> Result<Duration, BackendError>;

    /// Number of stored reviews. Untimed.
    fn stored_count(&self) -> Result<usize, BackendError>;

    /// Stored reviews per rating. Untimed.
    fn rating_distribution(&self) -> Result<RatingDistribution, BackendError>;
}

/// Add `count` reviews with `rating` to a distribution.
pub(crate) fn tally(
    dist: &mut RatingDistribution,
    rating: i64,
    count: usize,
) -> Result<(), BackendError> {
    match usize::try_from(rating) {
        Ok(r @ 1..=5) => {
            dist[r - 1] += count;
            Ok(())
        }
        _ => Err(BackendError::Unexpected(format!(
            "rating {} outside 1..=5",
            rating
        ))),
    }
}

/// Regular expression matching `term` literally. Both backends search with it.
pub(crate) fn term_pattern(term: &str) -> String {
    regex::escape(term)
}

/// Case-insensitive, Unicode-aware matcher for a search term.
pub(crate) fn term_matcher(term: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&term_pattern(term))
        .case_insensitive(true)
        .build()
}

/// Common row type returned by both backends' inspection queries.
pub mod rows {
    use chrono::{DateTime, Utc};

    /// A stored review, as either backend reports it.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ReviewRow {
        pub user_id: i64,
        pub book_id: i64,
        pub rating: u8,
        pub text: String,
        pub created_at: DateTime<Utc>,
    }
}
