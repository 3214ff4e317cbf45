//! Configuration management for the screen
//!
//! Sources, lowest precedence first:
//! - Hardcoded defaults
//! - `./config/qascreen.{toml,yaml,json}`
//! - File given explicitly or via the `QASCREEN_CONFIG` env var
//! - Environment variables (`QASCREEN__POLLING__INTERVAL_MS=500`)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CoreResult;
use crate::thresholds::ThresholdSet;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScreenConfig {
    #[serde(default)]
    pub cluster: ClusterConfig,

    #[serde(default)]
    pub thresholds: ThresholdSet,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub results: ResultsConfig,

    #[serde(default)]
    pub workload: WorkloadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScreenConfig {
    /// Load configuration from all sources, then validate it.
    pub fn load(explicit: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Self::set_defaults(Config::builder())?;

        builder = builder.add_source(File::with_name("./config/qascreen").required(false));

        if let Ok(config_path) = std::env::var("QASCREEN_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("QASCREEN")
                .separator("__")
                .try_parsing(true),
        );

        let config: ScreenConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config: ScreenConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let thresholds = ThresholdSet::default();
        builder
            // Cluster
            .set_default("cluster.node_ip", "127.0.0.1")?
            .set_default("cluster.node_port", 9042)?
            .set_default("cluster.jmx_port", 7199)?
            .set_default("cluster.jolokia_port", 8778)?
            .set_default("cluster.username", "")?
            .set_default("cluster.password", "")?
            // Thresholds
            .set_default("thresholds.live_sstable_count", thresholds.live_sstable_count)?
            .set_default(
                "thresholds.all_memtables_live_data_size",
                thresholds.all_memtables_live_data_size,
            )?
            .set_default("thresholds.read_latency_p95", thresholds.read_latency_p95)?
            .set_default("thresholds.write_latency_p95", thresholds.write_latency_p95)?
            // Polling
            .set_default("polling.interval_ms", 1000)?
            .set_default("polling.keyspace", "keyspace1")?
            .set_default("polling.wait_report_secs", 30)?
            // Results
            .set_default("results.keyspace", "qa_screen")?
            .set_default("results.table", "test_results")?
            .set_default("results.max_batch_entries", 400)?
            .set_default("results.database_dir", "./data")?
            .set_default("results.batch_size_warn_threshold_kb", 5)?
            .set_default("results.batch_size_fail_threshold_kb", 50)?
            // Workload
            .set_default("workload.executable", "/usr/bin/cassandra-stress")?
            .set_default("workload.number_of_writes", 100_000)?
            .set_default("workload.min_threads", 25)?
            .set_default("workload.max_threads", 100)?
            .set_default("workload.log_dir", "./logs")?
            .set_default("workload.graph_dir", "./graphs")?
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Message(
                "polling.interval_ms must be > 0".to_string(),
            ));
        }

        if self.results.max_batch_entries == 0 {
            return Err(ConfigError::Message(
                "results.max_batch_entries must be > 0".to_string(),
            ));
        }

        if self.results.batch_size_fail_threshold_kb < self.results.batch_size_warn_threshold_kb {
            return Err(ConfigError::Message(
                "results.batch_size_fail_threshold_kb must be >= batch_size_warn_threshold_kb"
                    .to_string(),
            ));
        }

        if self.workload.min_threads > self.workload.max_threads {
            return Err(ConfigError::Message(
                "workload.min_threads must be <= workload.max_threads".to_string(),
            ));
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::Message(format!(
                "logging.format must be \"pretty\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }

        let t = &self.thresholds;
        let limits = [
            t.live_sstable_count,
            t.all_memtables_live_data_size,
            t.read_latency_p95,
            t.write_latency_p95,
        ];
        if limits.iter().any(|limit| !limit.is_finite() || *limit < 0.0) {
            return Err(ConfigError::Message(
                "thresholds must be finite and >= 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Target cluster connection details
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub node_ip: String,

    /// Native protocol port
    pub node_port: u16,

    /// JMX port handed to the workload for its own metrics collection
    pub jmx_port: u16,

    /// Jolokia agent port used by the metric poller
    pub jolokia_port: u16,

    pub username: String,

    pub password: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_ip: "127.0.0.1".to_string(),
            node_port: 9042,
            jmx_port: 7199,
            jolokia_port: 8778,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl ClusterConfig {
    /// Username and password, only when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((self.username.as_str(), self.password.as_str()))
        }
    }
}

/// Metric polling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Sleep between samples in milliseconds
    pub interval_ms: u64,

    /// Keyspace the workload writes to
    pub keyspace: String,

    /// How often to log that we are still waiting on the workload
    pub wait_report_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            keyspace: "keyspace1".to_string(),
            wait_report_secs: 30,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn wait_report_interval(&self) -> Duration {
        Duration::from_secs(self.wait_report_secs)
    }
}

/// Result persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResultsConfig {
    pub keyspace: String,

    pub table: String,

    /// Maximum rows per batch statement. Lower it if batches are rejected as too large.
    pub max_batch_entries: usize,

    /// Directory holding the results database files
    pub database_dir: PathBuf,

    pub batch_size_warn_threshold_kb: usize,

    pub batch_size_fail_threshold_kb: usize,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            keyspace: "qa_screen".to_string(),
            table: "test_results".to_string(),
            max_batch_entries: 400,
            database_dir: PathBuf::from("./data"),
            batch_size_warn_threshold_kb: 5,
            batch_size_fail_threshold_kb: 50,
        }
    }
}

/// External load generator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkloadConfig {
    pub executable: PathBuf,

    pub number_of_writes: u64,

    pub min_threads: u32,

    pub max_threads: u32,

    pub log_dir: PathBuf,

    /// Directory for the workload's HTML graph and the screen's report
    pub graph_dir: PathBuf,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("/usr/bin/cassandra-stress"),
            number_of_writes: 100_000,
            min_threads: 25,
            max_threads: 100,
            log_dir: PathBuf::from("./logs"),
            graph_dir: PathBuf::from("./graphs"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::io::Write;

    #[test]
    fn test_default_configuration() {
        let config = ScreenConfig::default();

        assert_eq!(config.cluster.node_ip, "127.0.0.1");
        assert_eq!(config.cluster.node_port, 9042);
        assert_eq!(config.polling.interval(), Duration::from_secs(1));
        assert_eq!(config.polling.keyspace, "keyspace1");
        assert_eq!(config.results.max_batch_entries, 400);
        assert_eq!(config.workload.min_threads, 25);
        assert_eq!(config.workload.max_threads, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let mut cluster = ClusterConfig::default();
        assert!(cluster.credentials().is_none());

        cluster.username = "cassandra".to_string();
        assert!(cluster.credentials().is_none());

        cluster.password = "secret".to_string();
        assert_eq!(cluster.credentials(), Some(("cassandra", "secret")));
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ScreenConfig::default();

        config.polling.interval_ms = 0;
        assert!(config.validate().is_err());
        config.polling.interval_ms = 250;
        assert!(config.validate().is_ok());

        config.results.max_batch_entries = 0;
        assert!(config.validate().is_err());
        config.results.max_batch_entries = 100;

        config.workload.min_threads = 200;
        assert!(config.validate().is_err());
        config.workload.min_threads = 25;

        config.thresholds.read_latency_p95 = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_surfaces_as_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[polling]\ninterval_ms = 0").unwrap();

        let err = ScreenConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
        assert!(err.to_string().contains("polling.interval_ms"));
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[cluster]
node_ip = "10.0.0.5"
username = "cassandra"
password = "cassandra"

[thresholds]
live_sstable_count = 3
read_latency_p95 = 12.5

[results]
max_batch_entries = 50
"#
        )
        .unwrap();

        let config = ScreenConfig::from_file(file.path()).unwrap();

        assert_eq!(config.cluster.node_ip, "10.0.0.5");
        assert_eq!(config.cluster.node_port, 9042);
        assert_eq!(config.thresholds.live_sstable_count, 3.0);
        assert_eq!(config.thresholds.read_latency_p95, 12.5);
        assert_eq!(config.thresholds.write_latency_p95, 5_000.0);
        assert_eq!(config.results.max_batch_entries, 50);
        assert_eq!(config.results.table, "test_results");
    }
}
