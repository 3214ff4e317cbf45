//! Interval-driven metric sampling.
//!
//! The poller owns the series for the whole active phase. It samples, records,
//! checks thresholds and sleeps, then looks at the workload's completion
//! signal; the first sample is always taken, even if the workload is already
//! done. A failed attribute read discards that sample only.

use std::time::Duration;

use qascreen_core::{CompletionSignal, MetricField, MetricReading, ThresholdMonitor, TimeSeries};

use crate::error::SourceResult;
use crate::source::{MetricPlan, MetricSource};
use crate::wait::WaitReporter;

/// What the poll loop collected.
#[derive(Debug, Default)]
pub struct PollOutcome {
    pub series: TimeSeries,
    /// Samples recorded in the series.
    pub samples: usize,
    /// Samples dropped because an attribute read failed.
    pub discarded: usize,
    /// Total threshold breaches across all samples.
    pub breaches: usize,
}

/// Samples the four tracked metrics at a fixed interval.
pub struct MetricPoller<'a> {
    source: &'a dyn MetricSource,
    plan: MetricPlan,
    monitor: &'a ThresholdMonitor,
    interval: Duration,
    wait_reporter: Option<WaitReporter>,
}

impl<'a> MetricPoller<'a> {
    pub fn new(
        source: &'a dyn MetricSource,
        plan: MetricPlan,
        monitor: &'a ThresholdMonitor,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            plan,
            monitor,
            interval,
            wait_reporter: None,
        }
    }

    /// Logs progress through `reporter` on every iteration.
    pub fn with_wait_reporter(mut self, reporter: WaitReporter) -> Self {
        self.wait_reporter = Some(reporter);
        self
    }

    /// Takes one sample. Any failed read fails the whole sample.
    pub async fn poll(&self) -> SourceResult<MetricReading> {
        let mut values = [0.0; 4];

        for field in MetricField::ALL {
            for query in self.plan.queries(field) {
                values[field.index()] += self
                    .source
                    .get_attribute(&query.object_name, query.attribute)
                    .await?;
            }
        }

        let reading = MetricReading::now(values);
        tracing::debug!(
            timestamp = %reading.timestamp,
            live_sstable_count = reading.live_sstable_count,
            all_memtables_live_data_size = reading.all_memtables_live_data_size,
            read_latency_p95 = reading.read_latency_p95,
            write_latency_p95 = reading.write_latency_p95,
            "Sampled metrics"
        );

        Ok(reading)
    }

    /// Samples until `workload` reports completion.
    pub async fn run(&mut self, workload: &dyn CompletionSignal) -> PollOutcome {
        let mut outcome = PollOutcome::default();

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "Polling metrics");

        loop {
            match self.poll().await {
                Ok(reading) => {
                    if outcome.series.record(&reading).is_some() {
                        tracing::warn!(
                            timestamp = %reading.timestamp,
                            "Two samples share a timestamp; the earlier one was replaced"
                        );
                    } else {
                        outcome.samples += 1;
                    }
                    outcome.breaches += self.monitor.check(&reading).len();
                }
                Err(err) => {
                    outcome.discarded += 1;
                    tracing::error!(error = %err, "Failed to read metrics, discarding sample");
                }
            }

            if let Some(reporter) = self.wait_reporter.as_mut() {
                reporter.tick();
            }

            tokio::time::sleep(self.interval).await;

            if workload.is_done() {
                break;
            }
        }

        tracing::info!(
            samples = outcome.samples,
            discarded = outcome.discarded,
            breaches = outcome.breaches,
            "Polling finished"
        );

        outcome
    }
}
