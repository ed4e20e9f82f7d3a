//! SQLite backend.
//!
//! Stores the flat form of each record in the catalog's `reviews` table.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use regex::Regex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, Row};
use reviewdb_core::temporal::to_sql_text;
use reviewdb_core::{SourceReader, Temporal, CATALOG_SCHEMA};

use super::rows::ReviewRow;
use super::{tally, term_matcher, BackendAdapter, RatingDistribution};
use crate::error::{BackendError, BenchError};
use crate::workload::ReviewPair;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const INSERT_REVIEW: &str = "INSERT INTO reviews \
    (user_id, book_id, rating, review_text, created_at, updated_at, is_deleted) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const REVIEWS_BY_USER: &str =
    "SELECT user_id, book_id, rating, review_text, created_at FROM reviews WHERE user_id = ?1";

/// `contains_ci(text, term)`: `term` occurs in `text`, ignoring case
/// (Unicode case folding).
const CONTAINS_CI: &str = "contains_ci";

const SEARCH_REVIEWS: &str = "SELECT user_id, book_id, rating, review_text, created_at \
    FROM reviews WHERE contains_ci(review_text, ?1) LIMIT ?2";

/// Parameters of one review insert, formatted ahead of the timed write.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundReview<'a> {
    pub user_id: i64,
    pub book_id: i64,
    pub rating: u8,
    pub review_text: &'a str,
    pub created_at: String,
    pub updated_at: String,
    pub is_deleted: bool,
}

impl<'a> From<&'a ReviewPair> for BoundReview<'a> {
    fn from(pair: &'a ReviewPair) -> Self {
        let flat = &pair.flat;
        Self {
            user_id: flat.user_id,
            book_id: flat.book_id,
            rating: flat.rating,
            review_text: &flat.review_text,
            created_at: to_sql_text(&flat.created_at),
            updated_at: to_sql_text(&flat.updated_at),
            is_deleted: flat.is_deleted,
        }
    }
}

/// SQLite backend for benchmarks.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open an existing catalog database.
    ///
    /// A missing file is a connection error; the file is never created.
    pub fn open(path: &Path) -> Result<Self, BenchError> {
        let conn = SourceReader::open(path)
            .map_err(BenchError::connection)?
            .into_connection();
        let backend =
            Self::from_connection(conn).map_err(|e| BenchError::Connection(e.to_string()))?;
        backend
            .setup_schema()
            .map_err(|e| BenchError::Connection(e.to_string()))?;
        Ok(backend)
    }

    /// Create an in-memory database with the catalog schema.
    pub fn in_memory() -> Result<Self, BackendError> {
        let backend = Self::from_connection(Connection::open_in_memory()?)?;
        backend.setup_schema()?;
        Ok(backend)
    }

    /// Wrap an open connection and register the search function on it.
    /// The schema is assumed to exist.
    pub fn from_connection(conn: Connection) -> Result<Self, BackendError> {
        register_contains_ci(&conn)?;
        Ok(Self { conn })
    }

    /// Create the catalog tables if missing.
    pub fn setup_schema(&self) -> Result<(), BackendError> {
        self.conn.execute_batch(CATALOG_SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert records in one transaction.
    pub fn insert_reviews(&mut self, records: &[ReviewPair]) -> Result<(), BackendError> {
        let bound: Vec<BoundReview<'_>> = records.iter().map(BoundReview::from).collect();
        self.insert_bound(&bound)
    }

    /// Insert already-formatted rows in one transaction.
    pub fn insert_bound(&mut self, rows: &[BoundReview<'_>]) -> Result<(), BackendError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_REVIEW)?;
            for row in rows {
                stmt.execute(params![
                    row.user_id,
                    row.book_id,
                    row.rating,
                    row.review_text,
                    row.created_at,
                    row.updated_at,
                    row.is_deleted,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All reviews written by a user.
    pub fn reviews_by_user(&self, user_id: i64) -> Result<Vec<ReviewRow>, BackendError> {
        let mut stmt = self.conn.prepare_cached(REVIEWS_BY_USER)?;
        let rows = stmt
            .query_map([user_id], read_review)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Reviews whose text contains `term`, ignoring case.
    pub fn search_reviews(&self, term: &str, limit: usize) -> Result<Vec<ReviewRow>, BackendError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(SEARCH_REVIEWS)?;
        let rows = stmt
            .query_map(params![term, limit], read_review)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl BackendAdapter for SqliteBackend {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn insert_batch(&mut self, records: &[ReviewPair]) -> Result<Duration, BackendError> {
        let bound: Vec<BoundReview<'_>> = records.iter().map(BoundReview::from).collect();

        let start = Instant::now();
        self.insert_bound(&bound)?;
        Ok(start.elapsed())
    }

    fn query_by_key(&mut self, user_id: i64) -> Result<Duration, BackendError> {
        let start = Instant::now();
        let rows = self.reviews_by_user(user_id)?;
        let elapsed = start.elapsed();
        tracing::trace!(backend = "sqlite", user_id, rows = rows.len(), "lookup");
        Ok(elapsed)
    }

    fn text_search(&mut self, term: &str, limit: usize) -> Result<Duration, BackendError> {
        let start = Instant::now();
        let rows = self.search_reviews(term, limit)?;
        let elapsed = start.elapsed();
        tracing::trace!(backend = "sqlite", term, rows = rows.len(), "search");
        Ok(elapsed)
    }

    fn stored_count(&self) -> Result<usize, BackendError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|e| BackendError::Unexpected(e.to_string()))
    }

    fn rating_distribution(&self) -> Result<RatingDistribution, BackendError> {
        let mut stmt = self
            .conn
            .prepare("SELECT rating, COUNT(*) FROM reviews GROUP BY rating")?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut dist = RatingDistribution::default();
        for (rating, count) in counts {
            let count =
                usize::try_from(count).map_err(|e| BackendError::Unexpected(e.to_string()))?;
            tally(&mut dist, rating, count)?;
        }
        Ok(dist)
    }
}

/// Register `contains_ci` on a connection.
///
/// The compiled matcher is cached per statement on the `term` argument.
fn register_contains_ci(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_CI,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let matcher: Arc<Regex> = ctx.get_or_create_aux(1, |term| -> Result<Regex, BoxError> {
                Ok(term_matcher(term.as_str()?)?)
            })?;
            let text = ctx
                .get_raw(0)
                .as_str_or_null()
                .map_err(|e| rusqlite::Error::UserFunctionError(e.into()))?;
            Ok(text.is_some_and(|t| matcher.is_match(t)))
        },
    )
}

fn read_review(row: &Row<'_>) -> rusqlite::Result<ReviewRow> {
    let created_at: String = row.get(4)?;
    let created_at = Temporal::parse(&created_at)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unparseable timestamp {:?}", created_at).into(),
            )
        })?
        .to_instant();
    Ok(ReviewRow {
        user_id: row.get(0)?,
        book_id: row.get(1)?,
        rating: row.get(2)?,
        text: row.get(3)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::WorkloadGenerator;
    use chrono::{TimeZone, Utc};
    use reviewdb_core::Candidates;
    use std::sync::Arc;

    fn workload(n: usize) -> Vec<ReviewPair> {
        WorkloadGenerator::new(Arc::new(Candidates::new(vec![1, 2, 3], vec![7, 8])), 11)
            .unwrap()
            .with_anchor(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
            .pairs(n)
    }

    #[test]
    fn test_insert_and_count() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let records = workload(40);
        backend.insert_batch(&records).unwrap();
        assert_eq!(backend.stored_count().unwrap(), 40);

        let dist = backend.rating_distribution().unwrap();
        assert_eq!(dist.iter().sum::<usize>(), 40);
    }

    #[test]
    fn test_lookup_returns_user_reviews() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let records = workload(30);
        backend.insert_reviews(&records).unwrap();

        for user_id in [1, 2, 3] {
            let rows = backend.reviews_by_user(user_id).unwrap();
            let expected = records.iter().filter(|p| p.flat.user_id == user_id).count();
            assert_eq!(rows.len(), expected);
            assert!(rows.iter().all(|r| r.user_id == user_id));
        }
        assert!(backend.reviews_by_user(99).unwrap().is_empty());
        assert!(backend.query_by_key(1).is_ok());
    }

    #[test]
    fn test_timestamps_survive_storage() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let records = workload(5);
        backend.insert_reviews(&records).unwrap();

        let first = &records[0].flat;
        let rows = backend.reviews_by_user(first.user_id).unwrap();
        assert!(rows.iter().any(|r| r.created_at == first.created_at));
    }

    #[test]
    fn test_search_is_case_insensitive_and_limited() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let mut records = workload(6);
        for (i, pair) in records.iter_mut().enumerate() {
            pair.flat.review_text = if i % 2 == 0 {
                format!("Truly EXCELLENT #{}", i)
            } else {
                format!("Dull #{}", i)
            };
        }
        backend.insert_reviews(&records).unwrap();

        assert_eq!(backend.search_reviews("excellent", 10).unwrap().len(), 3);
        assert_eq!(backend.search_reviews("excellent", 2).unwrap().len(), 2);
        assert!(backend.text_search("excellent", 10).is_ok());
    }

    #[test]
    fn test_search_folds_unicode_case() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let mut records = workload(3);
        records[0].flat.review_text = "ÉCRIT avec soin".to_string();
        records[1].flat.review_text = "Straße und Brücke".to_string();
        records[2].flat.review_text = "plain".to_string();
        backend.insert_reviews(&records).unwrap();

        assert_eq!(backend.search_reviews("écrit", 10).unwrap().len(), 1);
        assert_eq!(backend.search_reviews("BRÜCKE", 10).unwrap().len(), 1);
        assert!(backend.search_reviews("ecrit", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_term_is_literal() {
        let mut backend = SqliteBackend::in_memory().unwrap();
        let mut records = workload(3);
        records[0].flat.review_text = "100% worth it".to_string();
        records[1].flat.review_text = "1000 pages".to_string();
        records[2].flat.review_text = "rated 4.5".to_string();
        backend.insert_reviews(&records).unwrap();

        assert_eq!(backend.search_reviews("100%", 10).unwrap().len(), 1);
        assert_eq!(backend.search_reviews("4.5", 10).unwrap().len(), 1);
        assert!(backend.search_reviews("4_5", 10).unwrap().is_empty());
        assert!(backend.search_reviews("(", 10).unwrap().is_empty());
    }

    #[test]
    fn test_bound_rows_carry_formatted_timestamps() {
        let records = workload(4);
        let bound: Vec<BoundReview<'_>> = records.iter().map(BoundReview::from).collect();
        for (row, pair) in bound.iter().zip(&records) {
            assert_eq!(row.created_at, to_sql_text(&pair.flat.created_at));
            assert_eq!(row.updated_at, to_sql_text(&pair.flat.updated_at));
            assert_eq!(row.review_text, pair.flat.review_text);
        }

        let mut backend = SqliteBackend::in_memory().unwrap();
        backend.insert_bound(&bound).unwrap();
        assert_eq!(backend.stored_count().unwrap(), 4);
        let stored: String = backend
            .connection()
            .query_row(
                "SELECT created_at FROM reviews ORDER BY review_id LIMIT 1",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, bound[0].created_at);
    }

    #[test]
    fn test_open_missing_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = SqliteBackend::open(&dir.path().join("missing.db"));
        assert!(matches!(result, Err(BenchError::Connection(_))));
    }
}
