//! Command line of the stress workload.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use qascreen_core::{ClusterConfig, WorkloadConfig};

/// Format of the run identifier shared by the log, graph and report paths.
pub const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Fully resolved invocation of the workload executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub run_id: String,
}

impl WorkloadSpec {
    /// Runs an arbitrary program. Used for custom workloads and tests.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I, run_id: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            run_id: run_id.into(),
        }
    }

    /// Builds the stress invocation, stamping the run identifier from `started`.
    pub fn stress(
        workload: &WorkloadConfig,
        cluster: &ClusterConfig,
        started: DateTime<Local>,
    ) -> Self {
        let run_id = started.format(RUN_ID_FORMAT).to_string();

        let mut args = vec![
            "mixed".to_string(),
            format!("n={}", workload.number_of_writes),
            "cl=one".to_string(),
            "-mode".to_string(),
            "native".to_string(),
            "cql3".to_string(),
        ];
        if let Some((user, password)) = cluster.credentials() {
            args.push(format!("user={user}"));
            args.push(format!("password={password}"));
        }
        args.extend([
            "-node".to_string(),
            cluster.node_ip.clone(),
            "-port".to_string(),
            format!("native={}", cluster.node_port),
            format!("jmx={}", cluster.jmx_port),
            "-rate".to_string(),
            format!("threads>={}", workload.min_threads),
            format!("threads<={}", workload.max_threads),
            "auto".to_string(),
            "-graph".to_string(),
            format!("file={}", graph_file(&workload.graph_dir, &run_id).display()),
            format!("title=test_{run_id}"),
            format!("revision={run_id}"),
            "-log".to_string(),
            format!("file={}", log_file(&workload.log_dir, &run_id).display()),
        ]);

        Self {
            program: workload.executable.clone(),
            args,
            run_id,
        }
    }

    /// Program name for log messages.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Command line with credentials masked.
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.starts_with("password=") {
                    "password=*****".to_string()
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn graph_file(graph_dir: &Path, run_id: &str) -> PathBuf {
    graph_dir.join(format!("cassandra-stress_{run_id}.html"))
}

pub fn log_file(log_dir: &Path, run_id: &str) -> PathBuf {
    log_dir.join(format!("cassandra-stress_{run_id}.log"))
}
