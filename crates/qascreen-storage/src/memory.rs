//! In-memory session for testing
//!
//! Keeps tables as ordered maps and records every executed batch so tests can
//! assert on batch boundaries and ordering. A failure script can be queued to
//! make specific `execute` calls fail.
//!
//! ```rust
//! use qascreen_storage::memory::{MemorySession, MockFailure};
//!
//! let session = MemorySession::new_with_failures(vec![
//!     MockFailure::Ok,
//!     MockFailure::TooLarge,  // second batch is rejected
//! ]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::RwLock;
use qascreen_core::SeriesRow;

use crate::batch_config::BatchSizeLimits;
use crate::error::{StorageError, StorageResult};
use crate::session::{validate_identifier, BatchStatement, NamespaceSpec, Session, TableSpec};

/// Scripted outcome for one `execute` call.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Reject the batch as too large.
    TooLarge,
    /// Reject the batch with a generic error.
    Rejected(&'static str),
    /// Let the batch through.
    Ok,
}

/// One recorded `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutedBatch {
    pub table: String,
    pub timestamps: Vec<String>,
    pub size_bytes: usize,
    pub success: bool,
}

#[derive(Default)]
struct State {
    namespaces: HashSet<String>,
    tables: HashMap<String, BTreeMap<String, SeriesRow>>,
    failures: VecDeque<MockFailure>,
    history: Vec<ExecutedBatch>,
    closed: bool,
}

/// Session keeping all data in memory.
pub struct MemorySession {
    state: RwLock<State>,
    limits: BatchSizeLimits,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            limits: BatchSizeLimits::unlimited(),
        }
    }

    /// Session whose `execute` calls follow `failures` in order, then succeed.
    pub fn new_with_failures(failures: Vec<MockFailure>) -> Self {
        let session = Self::new();
        session.state.write().failures = failures.into();
        session
    }

    /// Session enforcing request size limits like the real backend.
    pub fn with_limits(limits: BatchSizeLimits) -> Self {
        Self {
            state: RwLock::new(State::default()),
            limits,
        }
    }

    /// Every batch executed so far, successful or not.
    pub fn history(&self) -> Vec<ExecutedBatch> {
        self.state.read().history.clone()
    }

    /// Rows stored in `table`, ordered by timestamp.
    pub fn rows(&self, table: &TableSpec) -> Vec<(String, SeriesRow)> {
        self.state
            .read()
            .tables
            .get(&table.qualified_name())
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.state.read().namespaces.contains(name)
    }

    pub fn has_table(&self, table: &TableSpec) -> bool {
        self.state.read().tables.contains_key(&table.qualified_name())
    }

    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn release_version(&self) -> StorageResult<String> {
        Ok("memory".to_string())
    }

    async fn create_namespace_if_absent(&self, spec: &NamespaceSpec) -> StorageResult<()> {
        validate_identifier(&spec.name)?;
        self.state.write().namespaces.insert(spec.name.clone());
        Ok(())
    }

    async fn create_table_if_absent(&self, spec: &TableSpec) -> StorageResult<()> {
        validate_identifier(&spec.name)?;
        let mut state = self.state.write();
        if !state.namespaces.contains(&spec.namespace) {
            return Err(StorageError::Rejected(format!(
                "keyspace {} does not exist",
                spec.namespace
            )));
        }
        state.tables.entry(spec.qualified_name()).or_default();
        Ok(())
    }

    async fn execute(&self, batch: &BatchStatement) -> StorageResult<()> {
        let table = batch.table.qualified_name();
        let size_bytes = batch.size_bytes();
        let mut state = self.state.write();

        let scripted = state.failures.pop_front().unwrap_or(MockFailure::Ok);
        let result = match scripted {
            MockFailure::TooLarge => Err(StorageError::RequestTooLarge {
                size_bytes,
                limit_bytes: size_bytes.saturating_sub(1),
            }),
            MockFailure::Rejected(message) => Err(StorageError::Rejected(message.to_string())),
            MockFailure::Ok => self.limits.check(&table, size_bytes),
        };

        let result = result.and_then(|()| {
            let rows = state
                .tables
                .get_mut(&table)
                .ok_or_else(|| StorageError::UnknownTable(table.clone()))?;
            for row in &batch.rows {
                rows.insert(row.timestamp.clone(), row.values.clone());
            }
            Ok(())
        });

        state.history.push(ExecutedBatch {
            table,
            timestamps: batch.rows.iter().map(|row| row.timestamp.clone()).collect(),
            size_bytes,
            success: result.is_ok(),
        });

        result
    }

    async fn close(&self) {
        self.state.write().closed = true;
    }
}
