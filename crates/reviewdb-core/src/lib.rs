//! reviewdb core - review documents, relational mapping, and the document store.
//!
//! This crate provides the migration path of reviewdb: joined review rows are
//! read from the SQLite catalog, mapped to nested documents, and upserted by
//! natural key into a sled-backed document store.

pub mod error;
pub mod mapper;
pub mod migrate;
pub mod model;
pub mod sink;
pub mod source;
pub mod store;
pub mod temporal;

pub use error::{Error, MappingError, Result};
pub use mapper::{Column, DocumentMapper, JoinedRow, RowSchema, SourceValue};
pub use migrate::{migrate, MigrationStats, DEFAULT_BATCH_SIZE};
pub use model::{Book, Comment, Price, ReviewDocument, ReviewId, User};
pub use sink::{UpsertSink, Upserted};
pub use source::{Candidates, SourceReader, CATALOG_SCHEMA, JOIN_QUERY};
pub use store::{Collection, DocumentStore, Filter, StoreConfig};
pub use temporal::{normalize, Temporal};
