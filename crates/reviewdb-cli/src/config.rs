//! Command-line configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reviewdb_bench::{BenchConfig, SeedConfig};
use reviewdb_core::{StoreConfig, DEFAULT_BATCH_SIZE};

/// Default path of the SQLite catalog.
pub const DEFAULT_SQLITE_PATH: &str = "./reviewdb.sqlite";

/// Default directory of the sled document store.
pub const DEFAULT_STORE_PATH: &str = "./reviewdb-store";

/// Default document store page cache, in megabytes.
pub const DEFAULT_CACHE_MB: u64 = 256;

/// Default document store flush interval in milliseconds.
pub const DEFAULT_FLUSH_EVERY_MS: u64 = 1000;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "reviewdb")]
#[command(version, about = "Relational-to-document migration and backend benchmark", long_about = None)]
pub struct Args {
    /// Path to the SQLite catalog database.
    #[arg(long, global = true, default_value = DEFAULT_SQLITE_PATH)]
    pub sqlite_path: PathBuf,

    /// Path to the sled document store directory.
    #[arg(long, global = true, default_value = DEFAULT_STORE_PATH)]
    pub store_path: PathBuf,

    /// Document store page cache in megabytes.
    #[arg(long, global = true, default_value_t = DEFAULT_CACHE_MB)]
    pub cache_mb: u64,

    /// Document store flush interval in milliseconds (0 = flush only when a command finishes).
    #[arg(long, global = true, default_value_t = DEFAULT_FLUSH_EVERY_MS)]
    pub flush_every_ms: u64,

    /// Store documents uncompressed.
    #[arg(long, global = true)]
    pub no_compression: bool,

    /// Defaults to `bench`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compare SQLite and the document store on a generated workload.
    Bench(BenchArgs),
    /// Copy joined catalog reviews into the document store.
    Migrate(MigrateArgs),
    /// Create and fill the SQLite catalog with random data.
    Seed(SeedArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct BenchArgs {
    /// Reviews generated and inserted into each backend.
    #[arg(long, default_value_t = 1000)]
    pub reviews: usize,

    /// Lookups and searches issued per phase.
    #[arg(long, default_value_t = 100)]
    pub queries: usize,

    /// Maximum results per text search.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Workload seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl Default for BenchArgs {
    fn default() -> Self {
        let defaults = BenchConfig::default();
        Self {
            reviews: defaults.reviews,
            queries: defaults.queries,
            limit: defaults.search_limit,
            seed: defaults.seed,
        }
    }
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    /// Documents upserted per batch.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct SeedArgs {
    #[arg(long, default_value_t = 100)]
    pub users: usize,

    #[arg(long, default_value_t = 200)]
    pub books: usize,

    #[arg(long, default_value_t = 1000)]
    pub reviews: usize,

    #[arg(long, default_value_t = 12345)]
    pub seed: u64,
}

/// What to do, with everything it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Bench(BenchConfig),
    Migrate { batch_size: usize },
    Seed(SeedConfig),
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub sqlite_path: PathBuf,
    pub store: StoreConfig,
    pub action: Action,
}

impl Args {
    /// Convert command-line arguments to application configuration.
    pub fn into_config(self) -> AppConfig {
        let action = match self.command.unwrap_or(Command::Bench(BenchArgs::default())) {
            Command::Bench(args) => Action::Bench(
                BenchConfig::new()
                    .with_reviews(args.reviews)
                    .with_queries(args.queries)
                    .with_search_limit(args.limit)
                    .with_seed(args.seed),
            ),
            Command::Migrate(args) => Action::Migrate {
                batch_size: args.batch_size.max(1),
            },
            Command::Seed(args) => Action::Seed(SeedConfig {
                users: args.users,
                books: args.books,
                reviews: args.reviews,
                seed: args.seed,
            }),
        };

        let flush_every_ms = if self.flush_every_ms == 0 {
            None
        } else {
            Some(self.flush_every_ms)
        };

        let mut store = StoreConfig::new(self.store_path)
            .with_cache_capacity(self.cache_mb * 1024 * 1024)
            .with_flush_every_ms(flush_every_ms);
        if self.no_compression {
            store = store.without_compression();
        }

        AppConfig {
            sqlite_path: self.sqlite_path,
            store,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> AppConfig {
        Args::try_parse_from(argv).unwrap().into_config()
    }

    #[test]
    fn test_no_arguments_runs_bench_with_defaults() {
        let config = parse(&["reviewdb"]);
        assert_eq!(config.sqlite_path, PathBuf::from(DEFAULT_SQLITE_PATH));
        assert_eq!(config.store.path, PathBuf::from(DEFAULT_STORE_PATH));
        assert_eq!(config.action, Action::Bench(BenchConfig::default()));

        let defaults = StoreConfig::default();
        assert_eq!(config.store.cache_capacity, defaults.cache_capacity);
        assert_eq!(config.store.flush_every_ms, defaults.flush_every_ms);
        assert!(config.store.compression);
    }

    #[test]
    fn test_store_tuning_flags() {
        let config = parse(&[
            "reviewdb",
            "migrate",
            "--cache-mb",
            "8",
            "--flush-every-ms",
            "0",
            "--no-compression",
        ]);
        assert_eq!(config.store.cache_capacity, 8 * 1024 * 1024);
        assert_eq!(config.store.flush_every_ms, None);
        assert!(!config.store.compression);
        assert!(!config.store.temporary);
    }

    #[test]
    fn test_bench_flags() {
        let config = parse(&[
            "reviewdb", "bench", "--reviews", "50", "--queries", "7", "--limit", "3", "--seed", "9",
        ]);
        match config.action {
            Action::Bench(bench) => {
                assert_eq!(bench.reviews, 50);
                assert_eq!(bench.queries, 7);
                assert_eq!(bench.search_limit, 3);
                assert_eq!(bench.seed, 9);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_global_paths_after_subcommand() {
        let config = parse(&[
            "reviewdb",
            "migrate",
            "--batch-size",
            "0",
            "--sqlite-path",
            "/tmp/catalog.db",
            "--store-path",
            "/tmp/store",
        ]);
        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/catalog.db"));
        assert_eq!(config.store.path, PathBuf::from("/tmp/store"));
        assert_eq!(config.action, Action::Migrate { batch_size: 1 });
    }

    #[test]
    fn test_seed_flags() {
        let config = parse(&["reviewdb", "seed", "--users", "3", "--books", "4"]);
        assert_eq!(
            config.action,
            Action::Seed(SeedConfig {
                users: 3,
                books: 4,
                reviews: 1000,
                seed: 12345,
            })
        );
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["reviewdb", "bench", "--nope"]).is_err());
    }
}
