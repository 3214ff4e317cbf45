//! Storage session abstraction and the statements it executes.

use async_trait::async_trait;
use qascreen_core::{MetricField, SeriesRow};

use crate::error::{StorageError, StorageResult};

/// Longest namespace or table name accepted, matching the cluster's keyspace limit.
pub const MAX_IDENTIFIER_LEN: usize = 48;

/// Replication settings for a namespace. Fixed by deployment topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replication {
    /// One replica count per named datacenter.
    NetworkTopology {
        datacenter: String,
        replication_factor: u32,
    },
    /// Single replica count for the whole cluster.
    Simple { replication_factor: u32 },
}

impl Default for Replication {
    fn default() -> Self {
        Self::NetworkTopology {
            datacenter: "datacenter1".to_string(),
            replication_factor: 1,
        }
    }
}

/// Namespace (keyspace) to create if absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSpec {
    pub name: String,
    pub replication: Replication,
}

impl NamespaceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replication: Replication::default(),
        }
    }

    /// CQL text for this namespace.
    pub fn to_cql(&self) -> String {
        let replication = match &self.replication {
            Replication::NetworkTopology {
                datacenter,
                replication_factor,
            } => format!(
                "{{ 'class' : 'NetworkTopologyStrategy', '{datacenter}' : {replication_factor} }}"
            ),
            Replication::Simple { replication_factor } => format!(
                "{{ 'class' : 'SimpleStrategy', 'replication_factor' : {replication_factor} }}"
            ),
        };
        format!(
            "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {};",
            self.name, replication
        )
    }
}

/// Metrics results table: timestamp primary key plus one column per metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub namespace: String,
    pub name: String,
}

impl TableSpec {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// `namespace.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Column type of each metric, in serialization order.
    pub fn column_type(field: MetricField) -> &'static str {
        match field {
            MetricField::LiveSsTableCount => "int",
            MetricField::AllMemtablesLiveDataSize => "bigint",
            MetricField::ReadLatencyP95 | MetricField::WriteLatencyP95 => "double",
        }
    }

    /// CQL text for this table.
    pub fn to_cql(&self) -> String {
        let columns: Vec<String> = MetricField::ALL
            .iter()
            .map(|field| format!(" {} {}", field.name(), Self::column_type(*field)))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ( timestamp timestamp PRIMARY KEY,{});",
            self.qualified_name(),
            columns.join(",")
        )
    }
}

/// One row of a batch insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertRow {
    pub timestamp: String,
    pub values: SeriesRow,
}

/// An unlogged batch of inserts into one table.
///
/// Statements inside the batch carry no ordering guarantee and the batch skips
/// the backend's batch log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStatement {
    pub table: TableSpec,
    pub rows: Vec<InsertRow>,
}

impl BatchStatement {
    pub fn new(table: TableSpec) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, timestamp: impl Into<String>, values: SeriesRow) {
        self.rows.push(InsertRow {
            timestamp: timestamp.into(),
            values,
        });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full CQL text of the batch.
    pub fn to_cql(&self) -> String {
        let table = self.table.qualified_name();
        let columns: Vec<&str> = MetricField::ALL.iter().map(|field| field.name()).collect();
        let columns = columns.join(", ");

        let mut cql = String::from("BEGIN UNLOGGED BATCH\n");
        for row in &self.rows {
            cql.push_str(&format!(
                " INSERT INTO {} (timestamp, {})  VALUES ('{}', {});\n",
                table, columns, row.timestamp, row.values
            ));
        }
        cql.push_str("APPLY BATCH;");
        cql
    }

    /// Request size the backend sees, in bytes.
    pub fn size_bytes(&self) -> usize {
        self.to_cql().len()
    }
}

/// A connected storage backend.
#[async_trait]
pub trait Session: Send + Sync {
    /// Release version reported by the backend; used as a connectivity probe.
    async fn release_version(&self) -> StorageResult<String>;

    /// Creates the namespace unless it already exists.
    async fn create_namespace_if_absent(&self, spec: &NamespaceSpec) -> StorageResult<()>;

    /// Creates the table unless it already exists. The namespace must exist.
    async fn create_table_if_absent(&self, spec: &TableSpec) -> StorageResult<()>;

    /// Executes one batch atomically.
    async fn execute(&self, batch: &BatchStatement) -> StorageResult<()>;

    /// Releases the underlying connection.
    async fn close(&self);
}

/// Checks a namespace or table name before it is interpolated into a statement.
pub fn validate_identifier(name: &str) -> StorageResult<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && name.len() <= MAX_IDENTIFIER_LEN {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}
