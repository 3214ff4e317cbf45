//! CSV rendering of the cleaned series.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use qascreen_core::{MetricField, MetricReading};

pub fn report_path(graph_dir: &Path, run_id: &str) -> PathBuf {
    graph_dir.join(format!("TestScreen_{run_id}.csv"))
}

/// Writes one row per reading under a header naming every metric.
pub fn write_report(path: &Path, readings: &[MetricReading]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create report {}", path.display()))?;

    let mut header = vec!["timestamp"];
    header.extend(MetricField::ALL.iter().map(|field| field.name()));
    writer.write_record(&header)?;

    for reading in readings {
        let mut record = Vec::with_capacity(5);
        record.push(reading.timestamp.clone());
        record.extend(reading.values().iter().map(f64::to_string));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::info!(path = %path.display(), rows = readings.len(), "Wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = report_path(&dir.path().join("graphs"), "2024-01-01_00:00:00");
        let readings = vec![
            MetricReading::with_timestamp("2024-01-01 00:00:01.000", [1.0, 2.5, 3.0, 4.0]),
            MetricReading::with_timestamp("2024-01-01 00:00:02.000", [0.0, 0.0, 0.0, 0.0]),
        ];

        write_report(&path, &readings).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "timestamp,liveSSTableCount,allMemtablesLiveDataSize,readLatency95thPercentile,writeLatency95thPercentile"
        );
        assert_eq!(lines[1], "2024-01-01 00:00:01.000,1,2.5,3,4");
        assert_eq!(lines.len(), 3);
        assert!(path.ends_with("TestScreen_2024-01-01_00:00:00.csv"));
    }
}
