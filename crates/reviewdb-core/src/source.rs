//! Relational source: the SQLite catalog of users, books and reviews.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OpenFlags, Row};

use crate::error::{Error, MappingError, Result};
use crate::mapper::{Column, JoinedRow, RowSchema, SourceValue};

/// Relational schema of the catalog.
pub const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    email TEXT NOT NULL,
    is_admin INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_login TEXT
);

CREATE TABLE IF NOT EXISTS books (
    book_id INTEGER PRIMARY KEY AUTOINCREMENT,
    isbn TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    price REAL,
    publication_date TEXT,
    created_at TEXT,
    updated_at TEXT,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    book_id INTEGER NOT NULL,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    review_text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_reviews_user ON reviews(user_id);
CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews(book_id);
"#;

/// The review/user/book join, in the column order [`RowSchema`] expects.
///
/// Outer joins keep reviews whose user or book is gone; those rows fail
/// mapping and are skipped.
pub const JOIN_QUERY: &str = r#"
SELECT
    r.review_id,
    r.rating,
    r.review_text,
    r.created_at,
    r.updated_at,
    r.is_deleted,
    u.user_id,
    u.username,
    u.email,
    u.is_admin,
    u.created_at AS user_created_at,
    u.updated_at AS user_updated_at,
    u.last_login,
    b.book_id,
    b.isbn,
    b.title,
    b.description,
    b.price,
    b.publication_date
FROM reviews r
LEFT JOIN users u ON r.user_id = u.user_id
LEFT JOIN books b ON r.book_id = b.book_id
ORDER BY r.review_id
"#;

/// Immutable snapshot of the user and book ids a workload may reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidates {
    pub user_ids: Vec<i64>,
    pub book_ids: Vec<i64>,
}

impl Candidates {
    pub fn new(user_ids: Vec<i64>, book_ids: Vec<i64>) -> Self {
        Self { user_ids, book_ids }
    }

    /// Whether either id list is empty.
    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() || self.book_ids.is_empty()
    }
}

/// Reads users, books and joined reviews from the catalog database.
pub struct SourceReader {
    conn: Connection,
}

impl SourceReader {
    /// Open an existing catalog database.
    ///
    /// The file is not created when missing.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            Error::Connection(format!(
                "failed to open catalog at {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { conn })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the catalog tables if they do not exist.
    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(CATALOG_SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    /// Validate the join's declared columns against the row schema.
    pub fn row_schema(&self) -> Result<RowSchema> {
        let stmt = self.conn.prepare(JOIN_QUERY)?;
        Ok(RowSchema::validate(&stmt.column_names())?)
    }

    /// Load every user and book id, once, for workload sampling.
    pub fn load_candidates(&self) -> Result<Arc<Candidates>> {
        let user_ids = self.ids("SELECT user_id FROM users ORDER BY user_id")?;
        let book_ids = self.ids("SELECT book_id FROM books ORDER BY book_id")?;
        tracing::info!(
            users = user_ids.len(),
            books = book_ids.len(),
            "candidate ids loaded"
        );
        Ok(Arc::new(Candidates::new(user_ids, book_ids)))
    }

    /// Stream the join, one row at a time.
    ///
    /// The statement's columns are validated before the first row is read.
    /// Rows that cannot be read as source values are handed to `f` as
    /// mapping errors; errors returned by `f` stop the scan.
    pub fn for_each_row<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(std::result::Result<JoinedRow, MappingError>) -> Result<()>,
    {
        let mut stmt = self.conn.prepare(JOIN_QUERY)?;
        let schema = RowSchema::validate(&stmt.column_names())?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            f(read_row(row, &schema))?;
        }
        Ok(())
    }

    fn ids(&self, sql: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(sql)?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn read_row(row: &Row<'_>, schema: &RowSchema) -> std::result::Result<JoinedRow, MappingError> {
    let mut values = Vec::with_capacity(schema.width());
    for index in 0..schema.width() {
        let name = schema.column_at(index).map_or("?", Column::name);
        let raw = row
            .get_ref(index)
            .map_err(|e| MappingError::invalid(name, e.to_string()))?;
        let value =
            SourceValue::from_sqlite(raw).map_err(|reason| MappingError::invalid(name, reason))?;
        values.push(value);
    }
    Ok(JoinedRow::new(values))
}
