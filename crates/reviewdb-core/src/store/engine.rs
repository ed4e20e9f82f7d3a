//! Document store wrapping sled.

use sled::Db;

use super::{Collection, StoreConfig};
use crate::error::{Error, Result};

/// Suffix of the natural-key index tree paired with each collection.
pub(crate) const KEY_INDEX_SUFFIX: &str = ":keys";

/// Embedded document store.
///
/// Each collection is two sled trees: documents by store-assigned id, and a
/// natural-key index pointing at those ids.
pub struct DocumentStore {
    db: Db,
}

impl DocumentStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let db = config.to_sled_config().open().map_err(|e| {
            Error::Connection(format!(
                "failed to open document store at {}: {}",
                config.path.display(),
                e
            ))
        })?;
        tracing::debug!(
            path = %config.path.display(),
            temporary = config.temporary,
            recovered = db.was_recovered(),
            "document store opened"
        );
        Ok(Self { db })
    }

    /// Open a collection, creating its trees on first use.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let docs = self.db.open_tree(name)?;
        let keys = self.db.open_tree(format!("{}{}", name, KEY_INDEX_SUFFIX))?;
        Ok(Collection::new(name, self.db.clone(), docs, keys))
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}
