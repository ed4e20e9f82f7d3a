//! Subcommand implementations.

use std::path::Path;

use reviewdb_bench::{
    seed_catalog, BenchConfig, BenchError, BenchReport, BenchmarkHarness, DocumentBackend,
    SeedConfig, SeedStats, SqliteBackend,
};
use reviewdb_core::{migrate as run_migration, DocumentStore, MigrationStats, SourceReader, StoreConfig};
use rusqlite::Connection;

use crate::config::{Action, AppConfig};
use crate::error::Result;

/// Execute the configured action, writing results to stdout.
pub fn run(config: AppConfig) -> Result<()> {
    match config.action {
        Action::Bench(bench_config) => {
            let report = bench(&config.sqlite_path, config.store, bench_config)?;
            println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            eprint!("{}", report.summary());
        }
        Action::Migrate { batch_size } => {
            let stats = migrate(&config.sqlite_path, config.store, batch_size)?;
            println!(
                "{}",
                serde_json::json!({
                    "read": stats.read,
                    "migrated": stats.migrated,
                    "replaced": stats.replaced,
                    "skipped": stats.skipped,
                })
            );
        }
        Action::Seed(seed_config) => {
            let stats = seed(&config.sqlite_path, &seed_config)?;
            println!(
                "{}",
                serde_json::json!({
                    "users": stats.users,
                    "books": stats.books,
                    "reviews": stats.reviews,
                })
            );
        }
    }
    Ok(())
}

/// Run the SQLite-versus-sled comparison.
///
/// Both stores are opened before any phase runs; failing to open either is a
/// connection error.
pub fn bench(
    sqlite_path: &Path,
    store: StoreConfig,
    config: BenchConfig,
) -> std::result::Result<BenchReport, BenchError> {
    let reader = SourceReader::open(sqlite_path).map_err(BenchError::connection)?;
    reader.ensure_schema().map_err(BenchError::connection)?;
    let candidates = reader.load_candidates()?;
    let sqlite = SqliteBackend::from_connection(reader.into_connection())
        .map_err(|e| BenchError::Connection(e.to_string()))?;
    let sled = DocumentBackend::open(store, &config.collection)?;

    tracing::info!(
        reviews = config.reviews,
        queries = config.queries,
        limit = config.search_limit,
        "starting benchmark"
    );
    let mut harness = BenchmarkHarness::new(Box::new(sqlite), Box::new(sled), candidates, config);
    let report = harness.run()?;

    for backend in [harness.baseline(), harness.candidate()] {
        match (backend.stored_count(), backend.rating_distribution()) {
            (Ok(count), Ok(dist)) => {
                tracing::info!(backend = backend.name(), stored = count, ratings = ?dist, "backend contents")
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(backend = backend.name(), error = %e, "could not inspect backend")
            }
        }
    }
    Ok(report)
}

/// Copy the catalog's joined reviews into the document store.
pub fn migrate(sqlite_path: &Path, store: StoreConfig, batch_size: usize) -> Result<MigrationStats> {
    let source = SourceReader::open(sqlite_path)?;
    let store = DocumentStore::open(store)?;
    let reviews = store.collection("reviews")?;
    let stats = run_migration(&source, &reviews, batch_size)?;
    store.flush()?;
    Ok(stats)
}

/// Create the catalog at `sqlite_path` if needed and fill it.
pub fn seed(sqlite_path: &Path, config: &SeedConfig) -> Result<SeedStats> {
    let mut conn = Connection::open(sqlite_path)?;
    Ok(seed_catalog(&mut conn, config)?)
}
