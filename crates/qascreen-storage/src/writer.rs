//! Batched persistence of a finished time series.
//!
//! The series is split into consecutive chunks of at most `max_batch_entries`
//! rows. Each chunk becomes one unlogged batch, executed sequentially. A chunk
//! the backend rejects is logged with its index range and skipped; the rest of
//! the series is still written.

use std::ops::Range;

use qascreen_core::TimeSeries;

use crate::batch_config::BatchConfig;
use crate::error::{StorageError, StorageResult};
use crate::session::{BatchStatement, NamespaceSpec, Session, TableSpec};

/// Splits `len` entries into consecutive ranges of at most `max_entries`.
///
/// Produces `ceil(len / max_entries)` non-overlapping ranges covering `0..len`.
pub fn partition(len: usize, max_entries: usize) -> Vec<Range<usize>> {
    assert!(max_entries > 0, "max_entries must be > 0");
    (0..len)
        .step_by(max_entries)
        .map(|start| start..(start + max_entries).min(len))
        .collect()
}

/// Outcome of one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// 1-based position of the batch.
    pub number: usize,
    /// Entry index range within the series.
    pub range: Range<usize>,
    pub size_bytes: usize,
    /// `None` when the batch was written.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a `write_series` call.
#[derive(Debug, Clone, Default)]
pub struct WriteReport {
    pub batches: Vec<BatchOutcome>,
}

impl WriteReport {
    pub fn rows_written(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.succeeded())
            .map(|b| b.range.len())
            .sum()
    }

    pub fn failed_batches(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.batches.iter().filter(|b| !b.succeeded())
    }

    pub fn is_complete(&self) -> bool {
        self.batches.iter().all(BatchOutcome::succeeded)
    }
}

/// Writes time series into a [`Session`] in bounded batches.
pub struct BatchedWriter<'a> {
    session: &'a dyn Session,
    config: BatchConfig,
}

impl<'a> BatchedWriter<'a> {
    pub fn new(session: &'a dyn Session, config: BatchConfig) -> StorageResult<Self> {
        config.validate().map_err(|e| {
            StorageError::Rejected(format!("Invalid batch config: {}", e))
        })?;

        Ok(Self { session, config })
    }

    /// Creates the namespace and results table if they do not exist yet.
    pub async fn ensure_schema(&self, namespace: &str, table: &str) -> StorageResult<TableSpec> {
        self.session
            .create_namespace_if_absent(&NamespaceSpec::new(namespace))
            .await?;

        let spec = TableSpec::new(namespace, table);
        self.session.create_table_if_absent(&spec).await?;
        Ok(spec)
    }

    /// Ensures the schema exists, then writes every entry of `series`.
    ///
    /// Schema errors are returned. Batch errors are logged and recorded in the
    /// report; remaining batches are still attempted.
    pub async fn write_series(
        &self,
        namespace: &str,
        table: &str,
        series: &TimeSeries,
    ) -> StorageResult<WriteReport> {
        let spec = self.ensure_schema(namespace, table).await?;
        Ok(self.write_batches(&spec, series).await)
    }

    /// Writes `series` into an existing table.
    pub async fn write_batches(&self, table: &TableSpec, series: &TimeSeries) -> WriteReport {
        let max_entries = self.config.max_batch_entries;
        let entries: Vec<(&str, _)> = series.iter().collect();
        let ranges = partition(entries.len(), max_entries);
        let total = ranges.len();

        tracing::info!(
            table = %table.qualified_name(),
            entries = entries.len(),
            batches = total,
            max_batch_entries = max_entries,
            "Writing results"
        );

        let mut report = WriteReport::default();

        for (i, range) in ranges.into_iter().enumerate() {
            let number = i + 1;
            let mut batch = BatchStatement::new(table.clone());
            for (timestamp, row) in &entries[range.clone()] {
                batch.push(*timestamp, (*row).clone());
            }

            let size_bytes = batch.size_bytes();
            tracing::debug!(
                batch = number,
                of = total,
                start = range.start,
                end = range.end,
                size_bytes,
                "Executing batch"
            );

            let error = match self.session.execute(&batch).await {
                Ok(()) => None,
                Err(err) => {
                    if err.is_request_too_large() {
                        tracing::error!(
                            batch = number,
                            start = range.start,
                            end = range.end,
                            size_bytes,
                            max_batch_entries = max_entries,
                            error = %err,
                            "Batch is too large, you need to lower the maximum entries from '{}'",
                            max_entries
                        );
                    } else {
                        tracing::error!(
                            batch = number,
                            start = range.start,
                            end = range.end,
                            error = %err,
                            "Batch write failed"
                        );
                    }
                    Some(err.to_string())
                }
            };

            report.batches.push(BatchOutcome {
                number,
                range,
                size_bytes,
                error,
            });
        }

        tracing::info!(
            table = %table.qualified_name(),
            rows_written = report.rows_written(),
            failed_batches = report.failed_batches().count(),
            "Finished writing results"
        );

        report
    }
}
