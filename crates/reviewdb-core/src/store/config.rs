//! Document store configuration.

use std::path::PathBuf;

/// Configuration for the document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the store directory.
    pub path: PathBuf,

    /// Page cache capacity in bytes.
    pub cache_capacity: u64,

    /// Flush interval in milliseconds. None means flush only on explicit request.
    pub flush_every_ms: Option<u64>,

    /// Enable zstd compression.
    pub compression: bool,

    /// Temporary store (deleted on drop).
    pub temporary: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./reviewdb_docs"),
            cache_capacity: 256 * 1024 * 1024, // 256MB
            flush_every_ms: Some(1000),
            compression: true,
            temporary: false,
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a temporary configuration for testing.
    pub fn temporary() -> Self {
        Self {
            path: PathBuf::from(""),
            temporary: true,
            ..Default::default()
        }
    }

    /// Set the page cache capacity.
    pub fn with_cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Disable compression.
    pub fn without_compression(mut self) -> Self {
        self.compression = false;
        self
    }

    /// Set the flush interval.
    pub fn with_flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }

    /// Convert to sled configuration.
    pub(crate) fn to_sled_config(&self) -> sled::Config {
        let mut config = sled::Config::new()
            .cache_capacity(self.cache_capacity)
            .use_compression(self.compression)
            .flush_every_ms(self.flush_every_ms);

        if self.temporary {
            config = config.temporary(true);
        } else {
            config = config.path(&self.path);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert!(config.compression);
        assert!(!config.temporary);
        assert_eq!(config.flush_every_ms, Some(1000));
    }

    #[test]
    fn test_builders() {
        let config = StoreConfig::new("/tmp/docs")
            .with_cache_capacity(1024)
            .without_compression()
            .with_flush_every_ms(None);
        assert_eq!(config.path, PathBuf::from("/tmp/docs"));
        assert_eq!(config.cache_capacity, 1024);
        assert!(!config.compression);
        assert_eq!(config.flush_every_ms, None);
    }
}
