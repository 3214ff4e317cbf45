//! Batch sizing configuration

use crate::error::{StorageError, StorageResult};

/// Writer-side batch configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum number of series entries per batch statement
    pub max_batch_entries: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_entries: 400,
        }
    }
}

impl BatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_batch_entries == 0 {
            return Err("max_batch_entries must be > 0".to_string());
        }

        Ok(())
    }
}

/// Backend-side request size limits, in KiB.
///
/// Mirrors the cluster's `batch_size_warn_threshold_in_kb` and
/// `batch_size_fail_threshold_in_kb` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSizeLimits {
    pub warn_threshold_kb: usize,
    pub fail_threshold_kb: usize,
}

impl Default for BatchSizeLimits {
    fn default() -> Self {
        Self {
            warn_threshold_kb: 5,
            fail_threshold_kb: 50,
        }
    }
}

impl BatchSizeLimits {
    /// No limits at all.
    pub fn unlimited() -> Self {
        Self {
            warn_threshold_kb: usize::MAX / 1024,
            fail_threshold_kb: usize::MAX / 1024,
        }
    }

    /// Warns above the warn threshold and rejects above the fail threshold.
    pub fn check(&self, table: &str, size_bytes: usize) -> StorageResult<()> {
        let fail_bytes = self.fail_threshold_kb * 1024;
        if size_bytes > fail_bytes {
            return Err(StorageError::RequestTooLarge {
                size_bytes,
                limit_bytes: fail_bytes,
            });
        }

        let warn_bytes = self.warn_threshold_kb * 1024;
        if size_bytes > warn_bytes {
            tracing::warn!(
                table,
                size_bytes,
                warn_bytes,
                "Batch for {} is of size {} bytes, exceeding specified threshold of {} bytes",
                table,
                size_bytes,
                warn_bytes
            );
        }

        Ok(())
    }
}
