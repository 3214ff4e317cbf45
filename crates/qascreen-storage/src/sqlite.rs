//! SQLite-backed session.
//!
//! Each namespace is a separate database file attached to the session's single
//! connection, so `namespace.table` addressing works the same way it does on the
//! cluster. Batches run inside a transaction and use `INSERT OR REPLACE`, which
//! makes rewriting a series idempotent on its timestamp key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use qascreen_core::MetricField;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::batch_config::BatchSizeLimits;
use crate::error::{StorageError, StorageResult};
use crate::session::{validate_identifier, BatchStatement, NamespaceSpec, Session, TableSpec};

const MAIN_DATABASE_FILE: &str = "qascreen.db";

/// Connection options for [`SqliteSession`].
#[derive(Debug, Clone)]
pub struct SqliteSessionOptions {
    /// Directory holding the main database and one file per namespace.
    pub database_dir: PathBuf,
    pub limits: BatchSizeLimits,
}

impl SqliteSessionOptions {
    pub fn new(database_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_dir: database_dir.into(),
            limits: BatchSizeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: BatchSizeLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Storage session over a local SQLite database.
pub struct SqliteSession {
    pool: SqlitePool,
    database_dir: PathBuf,
    limits: BatchSizeLimits,
}

impl SqliteSession {
    /// Opens (creating if needed) the main database under `options.database_dir`.
    pub async fn connect(options: SqliteSessionOptions) -> StorageResult<Self> {
        tokio::fs::create_dir_all(&options.database_dir)
            .await
            .map_err(|e| {
                StorageError::Connection(format!(
                    "cannot create database directory {}: {}",
                    options.database_dir.display(),
                    e
                ))
            })?;

        let connect_options = SqliteConnectOptions::new()
            .filename(options.database_dir.join(MAIN_DATABASE_FILE))
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // Attached namespaces live on the connection, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(connect_options)
            .await?;

        tracing::info!(
            database_dir = %options.database_dir.display(),
            "Connected to results database"
        );

        Ok(Self {
            pool,
            database_dir: options.database_dir,
            limits: options.limits,
        })
    }

    pub fn database_dir(&self) -> &Path {
        &self.database_dir
    }

    /// Number of rows currently stored in `table`.
    pub async fn count_rows(&self, table: &TableSpec) -> StorageResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quoted_table(table)?);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// All rows of `table` in timestamp order, every value rendered as text.
    pub async fn fetch_rows(&self, table: &TableSpec) -> StorageResult<Vec<(String, [String; 4])>> {
        let columns: Vec<String> = MetricField::ALL
            .iter()
            .map(|field| format!("CAST({} AS TEXT)", field.name()))
            .collect();
        let sql = format!(
            "SELECT timestamp, {} FROM {} ORDER BY timestamp",
            columns.join(", "),
            quoted_table(table)?
        );

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                let timestamp: String = row.try_get(0)?;
                let mut values: [String; 4] = Default::default();
                for (offset, value) in values.iter_mut().enumerate() {
                    *value = row.try_get::<Option<String>, _>(offset + 1)?.unwrap_or_default();
                }
                Ok((timestamp, values))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(StorageError::from)
    }

    async fn attached_databases(&self) -> StorageResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_database_list")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }
}

#[async_trait]
impl Session for SqliteSession {
    async fn release_version(&self) -> StorageResult<String> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    async fn create_namespace_if_absent(&self, spec: &NamespaceSpec) -> StorageResult<()> {
        validate_identifier(&spec.name)?;

        if self.attached_databases().await?.contains(&spec.name) {
            tracing::debug!(namespace = %spec.name, "Namespace already attached");
            return Ok(());
        }

        let path = self.database_dir.join(format!("{}.db", spec.name));
        tracing::info!(
            namespace = %spec.name,
            path = %path.display(),
            replication = ?spec.replication,
            "Creating namespace (replication settings do not apply to a local database)"
        );

        let sql = format!("ATTACH DATABASE ?1 AS \"{}\"", spec.name);
        sqlx::query(&sql)
            .bind(path.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_table_if_absent(&self, spec: &TableSpec) -> StorageResult<()> {
        let columns: Vec<String> = MetricField::ALL
            .iter()
            .map(|field| format!("{} {}", field.name(), column_affinity(*field)))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (timestamp TEXT PRIMARY KEY NOT NULL, {})",
            quoted_table(spec)?,
            columns.join(", ")
        );

        tracing::info!(table = %spec.qualified_name(), "Creating results table");
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn execute(&self, batch: &BatchStatement) -> StorageResult<()> {
        let table = quoted_table(&batch.table)?;
        self.limits
            .check(&batch.table.qualified_name(), batch.size_bytes())?;

        let columns: Vec<&str> = MetricField::ALL.iter().map(|field| field.name()).collect();
        let sql = format!(
            "INSERT OR REPLACE INTO {} (timestamp, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
            table,
            columns.join(", ")
        );

        let mut tx = self.pool.begin().await?;
        for row in &batch.rows {
            let mut query = sqlx::query(&sql).bind(row.timestamp.as_str());
            for value in row.values.fields() {
                query = query.bind(value.as_str());
            }
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("Results database connection closed");
    }
}

fn quoted_table(table: &TableSpec) -> StorageResult<String> {
    validate_identifier(&table.namespace)?;
    validate_identifier(&table.name)?;
    Ok(format!("\"{}\".\"{}\"", table.namespace, table.name))
}

fn column_affinity(field: MetricField) -> &'static str {
    match field {
        MetricField::LiveSsTableCount | MetricField::AllMemtablesLiveDataSize => "INTEGER",
        MetricField::ReadLatencyP95 | MetricField::WriteLatencyP95 => "REAL",
    }
}
