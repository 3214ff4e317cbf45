#![cfg(unix)]

use std::fs;
use std::path::Path;

use qascreen_core::ScreenConfig;
use qascreen_monitor::{MetricPlan, MockMetricSource};
use qascreen_runner::execute;
use qascreen_storage::{MemorySession, MockFailure, TableSpec};
use qascreen_workload::{ProcessSupervisor, WorkloadHandle, WorkloadSpec};

fn config(graph_dir: &Path, max_batch_entries: usize) -> ScreenConfig {
    let mut config = ScreenConfig::default();
    config.polling.interval_ms = 5;
    config.results.max_batch_entries = max_batch_entries;
    config.workload.graph_dir = graph_dir.to_path_buf();
    config
}

fn workload(script: &str) -> WorkloadHandle {
    let spec = WorkloadSpec::new("/bin/sh", ["-c", script], "2024-05-05_10:00:00");
    ProcessSupervisor::start(&spec).unwrap()
}

fn source(config: &ScreenConfig, values: [f64; 4]) -> MockMetricSource {
    MockMetricSource::with_field_values(&MetricPlan::for_keyspace(&config.polling.keyspace), values)
}

#[tokio::test]
async fn test_screen_persists_series_and_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 3);
    let source = source(&config, [4.0, 1024.0, 850.0, 910.0]);
    let session = MemorySession::new();

    let summary = execute(&config, &source, &session, workload("sleep 0.1")).await;

    assert!(summary.workload_succeeded);
    assert!(summary.samples >= 1);
    assert_eq!(summary.discarded, 0);
    assert_eq!(summary.breaches, 0);
    assert_eq!(summary.zeroed_values, 0);
    assert!(summary.always_zero.is_empty());
    assert_eq!(summary.batches_failed, 0);
    assert_eq!(summary.rows_written, summary.samples);

    let table = TableSpec::new("qa_screen", "test_results");
    let rows = session.rows(&table);
    assert_eq!(rows.len(), summary.samples);
    assert_eq!(rows[0].1.to_string(), "4,1024,850,910");

    let report = summary.report.expect("report written");
    assert!(report.ends_with("TestScreen_2024-05-05_10:00:00.csv"));
    let lines = fs::read_to_string(report).unwrap().lines().count();
    assert_eq!(lines, summary.samples + 1);
}

#[tokio::test]
async fn test_finished_workload_still_yields_one_sample() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 400);
    let source = source(&config, [1.0, 1.0, 1.0, 1.0]);
    let session = MemorySession::new();

    let handle = workload("true");
    tokio::time::timeout(std::time::Duration::from_secs(10), async {
        while !handle.is_done() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let summary = execute(&config, &source, &session, handle).await;
    assert_eq!(summary.samples, 1);
    assert_eq!(summary.rows_written, 1);
}

#[tokio::test]
async fn test_failed_workload_and_batch_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path(), 1);
    let source = source(&config, [0.0, 2.0, 3.0, 4.0]);
    let session = MemorySession::new_with_failures(vec![MockFailure::Ok, MockFailure::TooLarge]);

    let summary = execute(&config, &source, &session, workload("sleep 0.1; exit 2")).await;

    assert!(!summary.workload_succeeded);
    assert!(summary.samples >= 2);
    assert_eq!(summary.batches_failed, 1);
    assert_eq!(summary.batches_written, summary.samples - 1);
    assert_eq!(summary.rows_written, summary.samples - 1);
    assert_eq!(summary.always_zero.len(), 1);
    assert_eq!(summary.always_zero[0].name(), "liveSSTableCount");
}
