use thiserror::Error;

/// Canonical error type for core screen operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A serialized series row did not have the expected shape.
    #[error("malformed series row `{row}`: {message}")]
    MalformedRow {
        /// The offending serialized row.
        row: String,
        /// Human-readable explanation.
        message: String,
    },
}

impl CoreError {
    /// Creates a `MalformedRow` variant.
    #[must_use]
    pub fn malformed_row(row: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            row: row.into(),
            message: message.into(),
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
