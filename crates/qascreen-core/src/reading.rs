//! A single timestamped sample of the tracked metrics.

use chrono::{DateTime, Utc};

use crate::metric::MetricField;

/// Timestamp layout for readings, always rendered in UTC. Lexical order
/// equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One sample of the four tracked metrics, taken at a single instant.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    /// UTC capture time formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,
    pub live_sstable_count: f64,
    pub all_memtables_live_data_size: f64,
    pub read_latency_p95: f64,
    pub write_latency_p95: f64,
}

impl MetricReading {
    /// Creates a reading stamped with the current UTC time.
    #[must_use]
    pub fn now(values: [f64; 4]) -> Self {
        Self::at(Utc::now(), values)
    }

    /// Creates a reading stamped with the given instant.
    #[must_use]
    pub fn at(instant: DateTime<Utc>, values: [f64; 4]) -> Self {
        Self::with_timestamp(instant.format(TIMESTAMP_FORMAT).to_string(), values)
    }

    /// Creates a reading with an already formatted timestamp.
    #[must_use]
    pub fn with_timestamp(timestamp: impl Into<String>, values: [f64; 4]) -> Self {
        Self {
            timestamp: timestamp.into(),
            live_sstable_count: values[0],
            all_memtables_live_data_size: values[1],
            read_latency_p95: values[2],
            write_latency_p95: values[3],
        }
    }

    /// Returns the value of a single field.
    #[must_use]
    pub fn value(&self, field: MetricField) -> f64 {
        match field {
            MetricField::LiveSsTableCount => self.live_sstable_count,
            MetricField::AllMemtablesLiveDataSize => self.all_memtables_live_data_size,
            MetricField::ReadLatencyP95 => self.read_latency_p95,
            MetricField::WriteLatencyP95 => self.write_latency_p95,
        }
    }

    /// Returns all field values in serialization order.
    #[must_use]
    pub fn values(&self) -> [f64; 4] {
        MetricField::ALL.map(|field| self.value(field))
    }
}
