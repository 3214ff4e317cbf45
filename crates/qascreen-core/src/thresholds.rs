//! Per-metric warning thresholds.

use serde::{Deserialize, Serialize};

use crate::metric::MetricField;
use crate::reading::MetricReading;

/// Upper bounds for each tracked metric. Loaded once and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ThresholdSet {
    pub live_sstable_count: f64,
    pub all_memtables_live_data_size: f64,
    pub read_latency_p95: f64,
    pub write_latency_p95: f64,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            live_sstable_count: 10.0,
            all_memtables_live_data_size: 100_000_000.0,
            read_latency_p95: 5_000.0,
            write_latency_p95: 5_000.0,
        }
    }
}

impl ThresholdSet {
    /// Limit configured for one field.
    #[must_use]
    pub fn limit(&self, field: MetricField) -> f64 {
        match field {
            MetricField::LiveSsTableCount => self.live_sstable_count,
            MetricField::AllMemtablesLiveDataSize => self.all_memtables_live_data_size,
            MetricField::ReadLatencyP95 => self.read_latency_p95,
            MetricField::WriteLatencyP95 => self.write_latency_p95,
        }
    }
}

/// A field value that exceeded its configured limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdBreach {
    pub field: MetricField,
    pub value: f64,
    pub threshold: f64,
}

/// Compares readings against a [`ThresholdSet`] and warns on every breach.
///
/// Breaches are reported only; they never alter the reading or stop polling.
#[derive(Debug, Clone)]
pub struct ThresholdMonitor {
    thresholds: ThresholdSet,
}

impl ThresholdMonitor {
    pub fn new(thresholds: ThresholdSet) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    /// Checks every field of `reading` and returns the breaches found.
    pub fn check(&self, reading: &MetricReading) -> Vec<ThresholdBreach> {
        let mut breaches = Vec::new();

        for field in MetricField::ALL {
            let value = reading.value(field);
            let threshold = self.thresholds.limit(field);

            if value > threshold {
                tracing::warn!(
                    field = %field,
                    value,
                    threshold,
                    timestamp = %reading.timestamp,
                    "Read {} '{}' is greater than the threshold '{}'",
                    field,
                    value,
                    threshold
                );
                breaches.push(ThresholdBreach {
                    field,
                    value,
                    threshold,
                });
            }
        }

        breaches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn thresholds() -> ThresholdSet {
        ThresholdSet {
            live_sstable_count: 10.0,
            all_memtables_live_data_size: 1_000.0,
            read_latency_p95: 50.0,
            write_latency_p95: 20.0,
        }
    }

    #[test]
    fn test_no_breach_at_threshold() {
        let monitor = ThresholdMonitor::new(thresholds());
        let reading = MetricReading::with_timestamp("t", [10.0, 1_000.0, 50.0, 20.0]);
        assert!(monitor.check(&reading).is_empty());
    }

    #[test]
    fn test_all_fields_checked_independently() {
        let monitor = ThresholdMonitor::new(thresholds());
        let reading = MetricReading::with_timestamp("t", [11.0, 5.0, 51.0, 21.0]);

        let fields: Vec<MetricField> = monitor.check(&reading).iter().map(|b| b.field).collect();
        assert_eq!(
            fields,
            vec![
                MetricField::LiveSsTableCount,
                MetricField::ReadLatencyP95,
                MetricField::WriteLatencyP95
            ]
        );
    }

    #[test]
    fn test_breach_carries_value_and_threshold() {
        let monitor = ThresholdMonitor::new(thresholds());
        let reading = MetricReading::with_timestamp("t", [0.0, 4_096.0, 0.0, 0.0]);
        let breaches = monitor.check(&reading);
        assert_eq!(
            breaches,
            vec![ThresholdBreach {
                field: MetricField::AllMemtablesLiveDataSize,
                value: 4_096.0,
                threshold: 1_000.0,
            }]
        );
    }

    proptest! {
        #[test]
        fn prop_breach_iff_value_exceeds_limit(
            values in prop::array::uniform4(0.0f64..2_000.0),
        ) {
            let limits = thresholds();
            let monitor = ThresholdMonitor::new(limits);
            let reading = MetricReading::with_timestamp("t", values);
            let breaches = monitor.check(&reading);

            for field in MetricField::ALL {
                let expected = reading.value(field) > limits.limit(field);
                let reported = breaches.iter().any(|b| b.field == field);
                prop_assert_eq!(expected, reported);
            }
        }
    }
}
