//! Metric sampling for the screen: the metric source abstraction, a Jolokia
//! client, a scripted mock source and the interval-driven poller.

pub mod error;
pub mod jolokia;
pub mod mock;
pub mod poller;
pub mod source;
pub mod wait;

pub use error::{SourceError, SourceResult};
pub use jolokia::{JolokiaConfig, JolokiaSource};
pub use mock::{MockMetricSource, MockResponse};
pub use poller::{MetricPoller, PollOutcome};
pub use source::{AttributeQuery, MetricPlan, MetricSource, STRESS_COLUMN_FAMILIES};
pub use wait::{format_elapsed, WaitReporter};
