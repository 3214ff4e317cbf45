//! Storage layer for screen results: session abstraction, SQLite and
//! in-memory sessions, and the batched series writer.

pub mod batch_config;
pub mod error;
pub mod memory;
pub mod session;
pub mod sqlite;
pub mod writer;

pub use batch_config::{BatchConfig, BatchSizeLimits};
pub use error::{StorageError, StorageResult};
pub use memory::{MemorySession, MockFailure};
pub use session::{BatchStatement, InsertRow, NamespaceSpec, Replication, Session, TableSpec};
pub use sqlite::{SqliteSession, SqliteSessionOptions};
pub use writer::{partition, BatchOutcome, BatchedWriter, WriteReport};
