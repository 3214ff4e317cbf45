use thiserror::Error;

/// Errors raised by storage sessions.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The request exceeded the backend's size limit.
    #[error("request of {size_bytes} bytes exceeds the {limit_bytes} byte limit")]
    RequestTooLarge {
        /// Size of the rejected request.
        size_bytes: usize,
        /// Configured limit.
        limit_bytes: usize,
    },

    /// A namespace or table identifier is not usable.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// The statement targets a namespace or table that does not exist.
    #[error("unknown table `{0}`")]
    UnknownTable(String),

    /// The backend rejected the statement for another reason.
    #[error("query rejected: {0}")]
    Rejected(String),
}

impl StorageError {
    /// Returns `true` when the backend refused the request because of its size.
    #[must_use]
    pub fn is_request_too_large(&self) -> bool {
        matches!(self, Self::RequestTooLarge { .. })
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(err.to_string()),
            other => Self::Rejected(other.to_string()),
        }
    }
}

/// Result alias bound to [`StorageError`].
pub type StorageResult<T> = std::result::Result<T, StorageError>;
