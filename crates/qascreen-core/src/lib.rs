//! Core domain types for the QA load-test screen.
//!
//! Holds the reading/series model shared by the poller, validator and writer,
//! the threshold monitor, the validator and the run configuration.

pub mod config;
pub mod error;
pub mod metric;
pub mod reading;
pub mod series;
pub mod thresholds;
pub mod traits;
pub mod validator;

pub use config::{
    ClusterConfig, LoggingConfig, PollingConfig, ResultsConfig, ScreenConfig, WorkloadConfig,
};
pub use error::{CoreError, CoreResult};
pub use metric::MetricField;
pub use reading::{MetricReading, TIMESTAMP_FORMAT};
pub use series::{SeriesRow, TimeSeries};
pub use thresholds::{ThresholdBreach, ThresholdMonitor, ThresholdSet};
pub use traits::CompletionSignal;
pub use validator::{parse_field, validate_series, FieldTotals, ValidationReport};
