#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use chrono::{Local, TimeZone};
use qascreen_core::{ClusterConfig, WorkloadConfig};
use qascreen_workload::{ProcessSupervisor, WorkloadSpec};

fn fake_stress(dir: &Path) -> std::path::PathBuf {
    let script = dir.join("cassandra-stress");
    let args_file = dir.join("args.txt");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"$@\" > {}\necho 'Running MIXED with 4 threads'\necho 'END'\n",
            args_file.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[tokio::test]
async fn test_stress_receives_generated_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let workload = WorkloadConfig {
        executable: fake_stress(dir.path()),
        number_of_writes: 1000,
        min_threads: 2,
        max_threads: 4,
        log_dir: dir.path().join("logs"),
        graph_dir: dir.path().join("graphs"),
    };
    let started = Local.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
    let spec = WorkloadSpec::stress(&workload, &ClusterConfig::default(), started);

    let summary = ProcessSupervisor::start(&spec).unwrap().wait().await.unwrap();
    assert_eq!(summary.run_id, "2024-06-01_08:30:00");
    assert_eq!(summary.exit_code, Some(0));

    let received = fs::read_to_string(dir.path().join("args.txt")).unwrap();
    assert!(received.starts_with("mixed n=1000 cl=one -mode native cql3 -node 127.0.0.1"));
    assert!(received.contains("threads>=2 threads<=4 auto"));
    assert!(received.contains("cassandra-stress_2024-06-01_08:30:00.log"));
}
