//! Ordered time series of serialized readings.
//!
//! The series is what gets persisted, so each entry keeps the serialized
//! 4-tuple exactly as captured. Typed values only exist on either side of it:
//! [`MetricReading`] before insertion, and the validator's cleaned output after.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::metric::MetricField;
use crate::reading::MetricReading;

/// Serialized field values of one series entry, in [`MetricField::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    fields: [String; 4],
}

impl SeriesRow {
    /// Builds a row from raw field values.
    #[must_use]
    pub fn new(fields: [String; 4]) -> Self {
        Self { fields }
    }

    /// Raw value of one field.
    #[must_use]
    pub fn field(&self, field: MetricField) -> &str {
        &self.fields[field.index()]
    }

    /// All raw values in serialization order.
    #[must_use]
    pub fn fields(&self) -> &[String; 4] {
        &self.fields
    }
}

impl From<&MetricReading> for SeriesRow {
    fn from(reading: &MetricReading) -> Self {
        Self::new(reading.values().map(|value| value.to_string()))
    }
}

impl fmt::Display for SeriesRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(","))
    }
}

impl FromStr for SeriesRow {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = s.split(',').collect();
        let fields: [String; 4] = match parts.as_slice() {
            [a, b, c, d] => [a, b, c, d].map(|part| part.to_string()),
            _ => {
                return Err(CoreError::malformed_row(
                    s,
                    format!("expected 4 comma-separated values, found {}", parts.len()),
                ))
            }
        };
        Ok(Self { fields })
    }
}

/// Ordered mapping from timestamp to serialized readings for a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
    entries: BTreeMap<String, SeriesRow>,
}

impl TimeSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a typed reading, serializing its values.
    ///
    /// Returns the row previously stored under the same timestamp, if any.
    pub fn record(&mut self, reading: &MetricReading) -> Option<SeriesRow> {
        self.insert(reading.timestamp.clone(), SeriesRow::from(reading))
    }

    /// Inserts an already serialized row.
    pub fn insert(&mut self, timestamp: impl Into<String>, row: SeriesRow) -> Option<SeriesRow> {
        self.entries.insert(timestamp.into(), row)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing was sampled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a row by timestamp.
    #[must_use]
    pub fn get(&self, timestamp: &str) -> Option<&SeriesRow> {
        self.entries.get(timestamp)
    }

    /// Iterates entries in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesRow)> {
        self.entries.iter().map(|(ts, row)| (ts.as_str(), row))
    }

    /// First and last timestamps, if any.
    #[must_use]
    pub fn span(&self) -> Option<(&str, &str)> {
        let first = self.entries.keys().next()?;
        let last = self.entries.keys().next_back()?;
        Some((first.as_str(), last.as_str()))
    }
}

impl FromIterator<(String, SeriesRow)> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = (String, SeriesRow)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
