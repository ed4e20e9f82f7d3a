//! Relational-to-document migration.

use crate::error::Result;
use crate::mapper::DocumentMapper;
use crate::model::ReviewDocument;
use crate::sink::{UpsertSink, Upserted};
use crate::source::SourceReader;

/// Default number of documents upserted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Totals for one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStats {
    /// Rows read from the join.
    pub read: usize,
    /// Documents written to the sink.
    pub migrated: usize,
    /// Of those, documents that replaced an existing one.
    pub replaced: usize,
    /// Rows skipped because they could not be mapped.
    pub skipped: usize,
}

/// Copy every joined review row into the sink as a nested document.
///
/// Rows that fail mapping are logged and skipped. Sink failures abort the run.
/// Re-running a migration over unchanged source data leaves the sink as it was.
pub fn migrate<S>(source: &SourceReader, sink: &S, batch_size: usize) -> Result<MigrationStats>
where
    S: UpsertSink + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mapper = DocumentMapper::new(source.row_schema()?);
    let mut stats = MigrationStats::default();
    let mut pending: Vec<ReviewDocument> = Vec::with_capacity(batch_size);

    source.for_each_row(|row| {
        stats.read += 1;
        match row.and_then(|row| mapper.map(&row)) {
            Ok(doc) => {
                pending.push(doc);
                if pending.len() >= batch_size {
                    flush(sink, &mut pending, &mut stats)?;
                }
            }
            Err(e) => {
                stats.skipped += 1;
                tracing::warn!(row = stats.read, error = %e, "skipping unmappable review row");
            }
        }
        Ok(())
    })?;
    flush(sink, &mut pending, &mut stats)?;

    tracing::info!(
        read = stats.read,
        migrated = stats.migrated,
        replaced = stats.replaced,
        skipped = stats.skipped,
        "migration complete"
    );
    Ok(stats)
}

fn flush<S>(sink: &S, pending: &mut Vec<ReviewDocument>, stats: &mut MigrationStats) -> Result<()>
where
    S: UpsertSink + ?Sized,
{
    if pending.is_empty() {
        return Ok(());
    }
    let outcomes = sink.upsert_batch(pending)?;
    stats.migrated += outcomes.len();
    stats.replaced += outcomes
        .iter()
        .filter(|o| **o == Upserted::Replaced)
        .count();
    tracing::debug!(batch = pending.len(), "upserted review batch");
    pending.clear();
    Ok(())
}
