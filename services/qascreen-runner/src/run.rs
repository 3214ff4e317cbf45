//! Top-level run controller.
//!
//! Setup failures (workload launch, storage connect, metric source connect)
//! are returned as errors. Everything after polling starts is logged and
//! folded into the [`RunSummary`].

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use qascreen_core::{validate_series, MetricField, ScreenConfig, ThresholdMonitor};
use qascreen_monitor::{
    JolokiaConfig, JolokiaSource, MetricPlan, MetricPoller, MetricSource, WaitReporter,
};
use qascreen_storage::{
    BatchConfig, BatchSizeLimits, BatchedWriter, Session, SqliteSession, SqliteSessionOptions,
};
use qascreen_workload::{ProcessSupervisor, WorkloadHandle, WorkloadSpec};

use crate::report;

/// Everything worth knowing about a finished run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_id: String,
    pub workload_succeeded: bool,
    pub samples: usize,
    pub discarded: usize,
    pub breaches: usize,
    pub zeroed_values: usize,
    pub always_zero: Vec<MetricField>,
    pub report: Option<PathBuf>,
    pub batches_written: usize,
    pub batches_failed: usize,
    pub rows_written: usize,
}

impl RunSummary {
    fn log(&self) {
        let always_zero: Vec<&str> = self.always_zero.iter().map(|f| f.name()).collect();
        tracing::info!(
            run_id = %self.run_id,
            workload_succeeded = self.workload_succeeded,
            samples = self.samples,
            discarded = self.discarded,
            breaches = self.breaches,
            zeroed_values = self.zeroed_values,
            always_zero = ?always_zero,
            batches_written = self.batches_written,
            batches_failed = self.batches_failed,
            rows_written = self.rows_written,
            "Screen finished"
        );
    }
}

/// Runs a full screen against the configured cluster.
pub async fn run(config: &ScreenConfig) -> anyhow::Result<RunSummary> {
    let spec = WorkloadSpec::stress(&config.workload, &config.cluster, Local::now());
    let workload = ProcessSupervisor::start(&spec)
        .with_context(|| format!("failed to start workload {}", spec.program.display()))?;

    let session = match connect_storage(config).await {
        Ok(session) => session,
        Err(err) => {
            workload.cancel();
            return Err(err);
        }
    };

    let source = match connect_source(config).await {
        Ok(source) => source,
        Err(err) => {
            workload.cancel();
            session.close().await;
            return Err(err);
        }
    };

    let summary = execute(config, &source, &session, workload).await;
    session.close().await;
    Ok(summary)
}

async fn connect_storage(config: &ScreenConfig) -> anyhow::Result<SqliteSession> {
    let limits = BatchSizeLimits {
        warn_threshold_kb: config.results.batch_size_warn_threshold_kb,
        fail_threshold_kb: config.results.batch_size_fail_threshold_kb,
    };
    let options = SqliteSessionOptions::new(&config.results.database_dir).with_limits(limits);

    let session = SqliteSession::connect(options).await.with_context(|| {
        format!(
            "failed to open results database in {}",
            config.results.database_dir.display()
        )
    })?;

    let version = session
        .release_version()
        .await
        .context("results database did not answer the version probe")?;
    tracing::info!(release_version = %version, "Connected to results storage");

    Ok(session)
}

async fn connect_source(config: &ScreenConfig) -> anyhow::Result<JolokiaSource> {
    let mut jolokia = JolokiaConfig::new(&config.cluster.node_ip, config.cluster.jolokia_port);
    jolokia.credentials = config
        .cluster
        .credentials()
        .map(|(user, password)| (user.to_string(), password.to_string()));
    let endpoint = jolokia.endpoint();

    JolokiaSource::connect(jolokia)
        .await
        .with_context(|| format!("failed to connect to metric source at {endpoint}"))
}

/// Polls while `workload` runs, then validates, reports and persists the series.
pub async fn execute(
    config: &ScreenConfig,
    source: &dyn MetricSource,
    session: &dyn Session,
    workload: WorkloadHandle,
) -> RunSummary {
    let mut summary = RunSummary {
        run_id: workload.run_id().to_string(),
        ..RunSummary::default()
    };

    let monitor = ThresholdMonitor::new(config.thresholds);
    let plan = MetricPlan::for_keyspace(&config.polling.keyspace);
    let reporter = WaitReporter::new(workload.name(), config.polling.wait_report_interval());
    let mut poller = MetricPoller::new(source, plan, &monitor, config.polling.interval())
        .with_wait_reporter(reporter);

    let outcome = poller.run(&workload).await;
    summary.samples = outcome.samples;
    summary.discarded = outcome.discarded;
    summary.breaches = outcome.breaches;

    match workload.wait().await {
        Ok(_) => summary.workload_succeeded = true,
        Err(err) => tracing::error!(error = %err, "Workload did not complete successfully"),
    }

    let validation = validate_series(&outcome.series);
    summary.zeroed_values = validation.zeroed_values;
    summary.always_zero = validation.always_zero.clone();

    let path = report::report_path(&config.workload.graph_dir, &summary.run_id);
    match report::write_report(&path, &validation.cleaned) {
        Ok(()) => summary.report = Some(path),
        Err(err) => tracing::error!(error = %format!("{err:#}"), "Failed to write report"),
    }

    let batch_config = BatchConfig {
        max_batch_entries: config.results.max_batch_entries,
    };
    let written = match BatchedWriter::new(session, batch_config) {
        Ok(writer) => {
            writer
                .write_series(&config.results.keyspace, &config.results.table, &outcome.series)
                .await
        }
        Err(err) => Err(err),
    };
    match written {
        Ok(report) => {
            summary.batches_failed = report.failed_batches().count();
            summary.batches_written = report.batches.len() - summary.batches_failed;
            summary.rows_written = report.rows_written();
        }
        Err(err) => tracing::error!(error = %err, "Failed to persist results"),
    }

    summary.log();
    summary
}
