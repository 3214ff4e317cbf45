//! Supervision of the external load workload.
//!
//! The workload runs as a child process owned by a background task. The task
//! streams the process output into the log and publishes the terminal state
//! on a watch channel as soon as the process exits, even when a background
//! child still holds its output open. Dropping or cancelling the handle kills
//! the process.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use qascreen_core::CompletionSignal;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::command::WorkloadSpec;
use crate::error::{WorkloadError, WorkloadResult};

/// Result of a workload that ran to a successful exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub run_id: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

/// Lifecycle of a supervised workload. Leaves `Running` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadState {
    Running,
    Completed(WorkloadSummary),
    Failed(String),
}

impl WorkloadState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkloadState::Running)
    }

    fn from_result(result: &WorkloadResult<WorkloadSummary>) -> Self {
        match result {
            Ok(summary) => WorkloadState::Completed(summary.clone()),
            Err(err) => WorkloadState::Failed(err.to_string()),
        }
    }
}

/// How long output still buffered in the pipes is forwarded after the exit.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Launches workloads as child processes.
pub struct ProcessSupervisor;

impl ProcessSupervisor {
    /// Spawns `spec` and starts streaming its output.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(spec: &WorkloadSpec) -> WorkloadResult<WorkloadHandle> {
        let name = spec.name();
        tracing::info!(
            workload = %name,
            run_id = %spec.run_id,
            args = %spec.display_args(),
            "Starting workload"
        );

        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkloadError::launch(spec.program.display().to_string(), e))?;

        let (state_tx, state_rx) = watch::channel(WorkloadState::Running);
        let run_id = spec.run_id.clone();
        let task_name = name.clone();

        let task =
            tokio::spawn(async move { supervise(child, &task_name, run_id, &state_tx).await });

        Ok(WorkloadHandle {
            name,
            run_id: spec.run_id.clone(),
            state: state_rx,
            task,
        })
    }
}

/// In-flight workload.
pub struct WorkloadHandle {
    name: String,
    run_id: String,
    state: watch::Receiver<WorkloadState>,
    task: JoinHandle<WorkloadResult<WorkloadSummary>>,
}

impl WorkloadHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WorkloadState {
        self.state.borrow().clone()
    }

    /// True once the process has exited or the supervisor stopped.
    pub fn is_done(&self) -> bool {
        self.state.borrow().is_terminal() || self.task.is_finished()
    }

    /// Waits for the terminal result.
    pub async fn wait(self) -> WorkloadResult<WorkloadSummary> {
        self.task.await?
    }

    /// Best-effort kill. A later [`wait`](Self::wait) reports the cancellation.
    pub fn cancel(&self) {
        if !self.is_done() {
            tracing::warn!(workload = %self.name, run_id = %self.run_id, "Cancelling workload");
        }
        self.task.abort();
    }
}

impl CompletionSignal for WorkloadHandle {
    fn is_done(&self) -> bool {
        WorkloadHandle::is_done(self)
    }
}

async fn supervise(
    mut child: Child,
    name: &str,
    run_id: String,
    state: &watch::Sender<WorkloadState>,
) -> WorkloadResult<WorkloadSummary> {
    let started = Instant::now();

    let forwarders: Vec<JoinHandle<io::Result<()>>> = [
        child
            .stdout
            .take()
            .map(|stdout| tokio::spawn(forward_lines(stdout, "stdout"))),
        child
            .stderr
            .take()
            .map(|stderr| tokio::spawn(forward_lines(stderr, "stderr"))),
    ]
    .into_iter()
    .flatten()
    .collect();

    let result = match child.wait().await {
        Ok(status) => finish(name, run_id, status, started.elapsed()),
        Err(err) => Err(err.into()),
    };
    // Nobody may be watching any more; the joined result still carries it.
    let _ = state.send(WorkloadState::from_result(&result));

    // Processes the workload left running in the background may keep the pipes open.
    let deadline = tokio::time::Instant::now() + OUTPUT_DRAIN_TIMEOUT;
    for forwarder in forwarders {
        let abort = forwarder.abort_handle();
        match tokio::time::timeout_at(deadline, forwarder).await {
            Ok(Ok(Err(err))) => {
                tracing::warn!(workload = %name, error = %err, "Failed to read workload output")
            }
            Ok(_) => {}
            Err(_) => {
                abort.abort();
                tracing::debug!(workload = %name, "Stopped forwarding output held open after exit");
            }
        }
    }

    result
}

fn finish(
    name: &str,
    run_id: String,
    status: ExitStatus,
    elapsed: Duration,
) -> WorkloadResult<WorkloadSummary> {
    if !status.success() {
        tracing::error!(workload = %name, run_id = %run_id, status = %status, "Workload failed");
        return Err(WorkloadError::Exited {
            code: status.code(),
        });
    }

    tracing::info!(
        workload = %name,
        run_id = %run_id,
        elapsed_secs = elapsed.as_secs_f64(),
        "Workload finished"
    );

    Ok(WorkloadSummary {
        run_id,
        exit_code: status.code(),
        elapsed,
    })
}

async fn forward_lines<R>(reader: R, stream: &'static str) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(segment) = segments.next_segment().await? {
        let line = String::from_utf8_lossy(&segment);
        tracing::debug!(target: "qascreen::workload", stream, "{}", line.trim_end());
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> WorkloadSpec {
        WorkloadSpec::new("/bin/sh", ["-c", script], "2024-01-01_00:00:00")
    }

    async fn wait_until_done(handle: &WorkloadHandle) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while !handle.is_done() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("workload did not finish");
    }

    #[tokio::test]
    async fn test_successful_workload_reports_summary() {
        let handle = ProcessSupervisor::start(&shell("echo one; echo two; echo three >&2")).unwrap();
        assert_eq!(handle.name(), "sh");

        wait_until_done(&handle).await;
        assert!(matches!(handle.state(), WorkloadState::Completed(_)));

        let summary = handle.wait().await.unwrap();
        assert_eq!(summary.exit_code, Some(0));
        assert_eq!(summary.run_id, "2024-01-01_00:00:00");
    }

    #[tokio::test]
    async fn test_exit_is_observed_while_background_child_holds_output() {
        let handle = ProcessSupervisor::start(&shell("sleep 3 & exit 0")).unwrap();

        tokio::time::timeout(Duration::from_millis(1500), async {
            while !handle.is_done() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("exit was not published while output was held open");
        assert!(matches!(handle.state(), WorkloadState::Completed(_)));

        let summary = tokio::time::timeout(Duration::from_secs(2), handle.wait())
            .await
            .expect("wait blocked on the background child")
            .unwrap();
        assert_eq!(summary.exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_terminal_failure() {
        let handle = ProcessSupervisor::start(&shell("exit 3")).unwrap();

        wait_until_done(&handle).await;
        assert!(matches!(handle.state(), WorkloadState::Failed(_)));

        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, WorkloadError::Exited { code: Some(3) }));
    }

    #[tokio::test]
    async fn test_missing_executable_fails_to_launch() {
        let spec = WorkloadSpec::new("/nonexistent/cassandra-stress", ["mixed"], "id");
        let err = ProcessSupervisor::start(&spec).err().unwrap();
        assert!(matches!(err, WorkloadError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_running_workload_is_not_done() {
        let handle = ProcessSupervisor::start(&shell("sleep 30")).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_done());
        assert_eq!(handle.state(), WorkloadState::Running);

        handle.cancel();
        wait_until_done(&handle).await;
        let err = handle.wait().await.unwrap_err();
        assert!(matches!(err, WorkloadError::Join(_)));
    }
}
