//! Relational row to review document mapping.
//!
//! The join of `reviews`, `users` and `books` is read as a flat row whose
//! columns are addressed by name through a [`RowSchema`] validated once
//! against the statement, then mapped to a [`ReviewDocument`](crate::model::ReviewDocument).

mod document_mapper;
mod row;
mod schema;

pub use document_mapper::DocumentMapper;
pub use row::{JoinedRow, SourceValue};
pub use schema::{Column, RowSchema};
