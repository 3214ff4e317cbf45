//! Post-run validation of a collected series.
//!
//! Every raw field is re-parsed. Values that are unparsable or negative are
//! logged and replaced with zero in the cleaned output; the input series is
//! left untouched so the persisted data keeps what was actually read.

use crate::metric::MetricField;
use crate::reading::MetricReading;
use crate::series::TimeSeries;

/// Parses one raw field value, degrading unusable input to `0`.
///
/// Unparsable, non-finite and negative values all yield `0.0`; each case is
/// logged with the field name and timestamp.
pub fn parse_field(raw: &str, field: MetricField, timestamp: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_finite() => {
            tracing::error!(
                field = %field,
                timestamp,
                raw,
                "Timestamp {} value {} '{}' is not a valid number",
                timestamp,
                field,
                raw
            );
            0.0
        }
        Ok(value) if value < 0.0 => {
            tracing::error!(
                field = %field,
                timestamp,
                raw,
                "Timestamp {} value {} '{}' is negative",
                timestamp,
                field,
                raw
            );
            0.0
        }
        Ok(value) => value,
        Err(_) => {
            tracing::error!(
                field = %field,
                timestamp,
                raw,
                "Timestamp {} value {} '{}' is not a valid number",
                timestamp,
                field,
                raw
            );
            0.0
        }
    }
}

/// Per-field running sums across a whole series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldTotals {
    totals: [f64; 4],
}

impl FieldTotals {
    pub fn add(&mut self, field: MetricField, value: f64) {
        self.totals[field.index()] += value;
    }

    #[must_use]
    pub fn get(&self, field: MetricField) -> f64 {
        self.totals[field.index()]
    }
}

/// Result of validating a finished series.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Readings with every field coerced to a usable number, in series order.
    pub cleaned: Vec<MetricReading>,
    pub totals: FieldTotals,
    /// Number of individual field values that were replaced with zero.
    pub zeroed_values: usize,
    /// Fields whose total across the whole series is exactly zero.
    pub always_zero: Vec<MetricField>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.zeroed_values == 0 && self.always_zero.is_empty()
    }
}

/// Validates every reading of `series` and computes aggregate sanity checks.
pub fn validate_series(series: &TimeSeries) -> ValidationReport {
    tracing::info!(entries = series.len(), "Validating collected metrics");

    let mut report = ValidationReport {
        cleaned: Vec::with_capacity(series.len()),
        ..ValidationReport::default()
    };

    for (timestamp, row) in series.iter() {
        let mut values = [0.0; 4];
        for field in MetricField::ALL {
            let raw = row.field(field);
            let value = parse_field(raw, field, timestamp);
            if value == 0.0 && !is_literal_zero(raw) {
                report.zeroed_values += 1;
            }
            report.totals.add(field, value);
            values[field.index()] = value;
        }

        let reading = MetricReading::with_timestamp(timestamp, values);
        tracing::debug!(
            timestamp,
            live_sstable_count = reading.live_sstable_count,
            all_memtables_live_data_size = reading.all_memtables_live_data_size,
            read_latency_p95 = reading.read_latency_p95,
            write_latency_p95 = reading.write_latency_p95,
            "Validated reading"
        );
        report.cleaned.push(reading);
    }

    for field in MetricField::ALL {
        if report.totals.get(field) == 0.0 {
            tracing::error!(field = %field, "{} is always zero in results set", field);
            report.always_zero.push(field);
        }
    }

    report
}

fn is_literal_zero(raw: &str) -> bool {
    matches!(raw.trim().parse::<f64>(), Ok(value) if value == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::SeriesRow;
    use proptest::prelude::*;

    fn row(text: &str) -> SeriesRow {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_field_accepts_non_negative_numbers() {
        assert_eq!(parse_field("42", MetricField::LiveSsTableCount, "t"), 42.0);
        assert_eq!(parse_field("1.25", MetricField::ReadLatencyP95, "t"), 1.25);
        assert_eq!(parse_field(" 7 ", MetricField::ReadLatencyP95, "t"), 7.0);
        assert_eq!(parse_field("0", MetricField::ReadLatencyP95, "t"), 0.0);
    }

    #[test]
    fn test_parse_field_degrades_bad_input_to_zero() {
        assert_eq!(parse_field("abc", MetricField::LiveSsTableCount, "t"), 0.0);
        assert_eq!(parse_field("", MetricField::LiveSsTableCount, "t"), 0.0);
        assert_eq!(parse_field("-3.5", MetricField::WriteLatencyP95, "t"), 0.0);
        assert_eq!(parse_field("NaN", MetricField::WriteLatencyP95, "t"), 0.0);
        assert_eq!(parse_field("inf", MetricField::WriteLatencyP95, "t"), 0.0);
    }

    #[test]
    fn test_unparsable_value_is_zeroed_in_cleaned_series_only() {
        let mut series = TimeSeries::new();
        series.insert("2024-01-01 00:00:00.000", row("abc,100,1.5,2.5"));
        series.insert("2024-01-01 00:00:01.000", row("4,200,1.0,2.0"));

        let report = validate_series(&series);

        assert_eq!(report.cleaned[0].live_sstable_count, 0.0);
        assert_eq!(report.cleaned[1].live_sstable_count, 4.0);
        assert_eq!(report.zeroed_values, 1);
        assert_eq!(
            series
                .get("2024-01-01 00:00:00.000")
                .unwrap()
                .field(MetricField::LiveSsTableCount),
            "abc"
        );
    }

    #[test]
    fn test_totals_accumulate_per_field() {
        let mut series = TimeSeries::new();
        series.insert("a", row("1,10,0.5,0"));
        series.insert("b", row("2,20,0.25,0"));

        let report = validate_series(&series);

        assert_eq!(report.totals.get(MetricField::LiveSsTableCount), 3.0);
        assert_eq!(report.totals.get(MetricField::AllMemtablesLiveDataSize), 30.0);
        assert_eq!(report.totals.get(MetricField::ReadLatencyP95), 0.75);
        assert_eq!(report.always_zero, vec![MetricField::WriteLatencyP95]);
        assert_eq!(report.zeroed_values, 0);
    }

    #[test]
    fn test_empty_series_flags_every_field() {
        let report = validate_series(&TimeSeries::new());
        assert!(report.cleaned.is_empty());
        assert_eq!(report.always_zero, MetricField::ALL.to_vec());
    }

    #[test]
    fn test_clean_series_reports_clean() {
        let mut series = TimeSeries::new();
        series.insert("a", row("1,1,1,1"));
        assert!(validate_series(&series).is_clean());
    }

    proptest! {
        #[test]
        fn prop_parse_field_returns_value_or_zero(raw in ".{0,12}") {
            let value = parse_field(&raw, MetricField::ReadLatencyP95, "t");
            match raw.trim().parse::<f64>() {
                Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => prop_assert_eq!(value, parsed),
                _ => prop_assert_eq!(value, 0.0),
            }
        }

        #[test]
        fn prop_non_negative_numbers_round_trip(number in 0.0f64..1.0e12) {
            let value = parse_field(&number.to_string(), MetricField::AllMemtablesLiveDataSize, "t");
            prop_assert_eq!(value, number);
        }

        #[test]
        fn prop_always_zero_flagged_once_regardless_of_length(len in 1usize..200) {
            let series: TimeSeries = (0..len)
                .map(|i| (format!("{i:06}"), row("0,5,5,5")))
                .collect();
            let report = validate_series(&series);
            prop_assert_eq!(report.always_zero, vec![MetricField::LiveSsTableCount]);
        }
    }
}
