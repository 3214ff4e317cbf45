use thiserror::Error;

/// Errors raised while reading attributes from a metric source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The MBean or attribute does not exist on the target.
    #[error("{object_name} `{attribute}` was not found")]
    NotFound {
        object_name: String,
        attribute: String,
    },

    /// The metric source could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The attribute exists but its value is not a number.
    #[error("{object_name} `{attribute}` is not numeric: {value}")]
    InvalidValue {
        object_name: String,
        attribute: String,
        value: String,
    },

    /// The source answered with an unexpected error.
    #[error("metric source error: {0}")]
    Remote(String),
}

impl SourceError {
    #[must_use]
    pub fn not_found(object_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::NotFound {
            object_name: object_name.into(),
            attribute: attribute.into(),
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Remote(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Result alias bound to [`SourceError`].
pub type SourceResult<T> = std::result::Result<T, SourceError>;
