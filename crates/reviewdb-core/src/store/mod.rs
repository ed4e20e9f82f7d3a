//! Embedded document store for reviewdb.
//!
//! This module provides a sled-based JSON document store with natural-key
//! upserts, batch inserts, and filter scans.

mod collection;
mod config;
mod engine;
mod filter;

pub mod key;

pub use collection::Collection;
pub use config::StoreConfig;
pub use engine::DocumentStore;
pub use filter::Filter;
