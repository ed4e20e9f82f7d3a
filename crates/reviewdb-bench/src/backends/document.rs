//! sled document-store backend.
//!
//! Stores the rich form of each record as a JSON document.

use std::time::{Duration, Instant};

use reviewdb_core::{Collection, DocumentStore, Filter, StoreConfig};
use serde_json::Value;

use super::rows::ReviewRow;
use super::{tally, term_pattern, BackendAdapter, RatingDistribution};
use crate::error::{BackendError, BenchError};
use crate::workload::{ReviewPair, RichReview};

/// Document backend for benchmarks.
pub struct DocumentBackend {
    reviews: Collection,
}

impl DocumentBackend {
    /// Open the store and the named collection.
    pub fn open(config: StoreConfig, collection: &str) -> Result<Self, BenchError> {
        let store = DocumentStore::open(config).map_err(BenchError::connection)?;
        let reviews = store.collection(collection).map_err(BenchError::connection)?;
        Ok(Self { reviews })
    }

    /// Open a throwaway store, removed on drop.
    pub fn temporary(collection: &str) -> Result<Self, BenchError> {
        Self::open(StoreConfig::temporary(), collection)
    }

    pub fn collection(&self) -> &Collection {
        &self.reviews
    }

    /// Insert rich documents in one batch.
    pub fn insert_reviews(&self, records: &[RichReview]) -> Result<(), BackendError> {
        self.reviews.insert_many(records)?;
        Ok(())
    }

    /// All reviews written by a user.
    pub fn reviews_by_user(&self, user_id: i64) -> Result<Vec<ReviewRow>, BackendError> {
        let found = self.reviews.find(&Filter::eq("user_id", user_id), None)?;
        found.into_iter().map(to_row).collect()
    }

    /// Reviews whose main text or any comment contains `term`, ignoring case.
    pub fn search_reviews(&self, term: &str, limit: usize) -> Result<Vec<ReviewRow>, BackendError> {
        let filter = search_filter(term)?;
        let found = self.reviews.find(&filter, Some(limit))?;
        found.into_iter().map(to_row).collect()
    }
}

impl BackendAdapter for DocumentBackend {
    fn name(&self) -> &str {
        "sled"
    }

    fn insert_batch(&mut self, records: &[ReviewPair]) -> Result<Duration, BackendError> {
        let rich: Vec<&RichReview> = records.iter().map(|p| &p.rich).collect();
        let encoded = Collection::encode_many(&rich)?;

        let start = Instant::now();
        self.reviews.insert_encoded(encoded)?;
        Ok(start.elapsed())
    }

    fn query_by_key(&mut self, user_id: i64) -> Result<Duration, BackendError> {
        let filter = Filter::eq("user_id", user_id);

        let start = Instant::now();
        let found = self.reviews.find(&filter, None)?;
        let elapsed = start.elapsed();

        tracing::trace!(backend = "sled", user_id, rows = found.len(), "lookup");
        Ok(elapsed)
    }

    fn text_search(&mut self, term: &str, limit: usize) -> Result<Duration, BackendError> {
        let filter = search_filter(term)?;

        let start = Instant::now();
        let found = self.reviews.find(&filter, Some(limit))?;
        let elapsed = start.elapsed();

        tracing::trace!(backend = "sled", term, rows = found.len(), "search");
        Ok(elapsed)
    }

    fn stored_count(&self) -> Result<usize, BackendError> {
        Ok(self.reviews.len())
    }

    fn rating_distribution(&self) -> Result<RatingDistribution, BackendError> {
        let mut dist = RatingDistribution::default();
        for entry in self.reviews.iter() {
            let (id, doc) = entry?;
            let rating = doc["rating"].as_i64().ok_or_else(|| {
                BackendError::Unexpected(format!("document {} has no integer rating", id))
            })?;
            tally(&mut dist, rating, 1)?;
        }
        Ok(dist)
    }
}

/// Literal `term` in the main text or in any nested comment.
fn search_filter(term: &str) -> Result<Filter, BackendError> {
    let pattern = term_pattern(term);
    Ok(Filter::or(vec![
        Filter::regex_ci("main_review", &pattern)?,
        Filter::regex_ci("comments.comment", &pattern)?,
    ]))
}

fn to_row(doc: Value) -> Result<ReviewRow, BackendError> {
    let review: RichReview = serde_json::from_value(doc)
        .map_err(|e| BackendError::Unexpected(format!("malformed review document: {}", e)))?;
    Ok(ReviewRow {
        user_id: review.user_id,
        book_id: review.book_id,
        rating: review.rating,
        text: review.main_review,
        created_at: review.created_at,
    })
}
