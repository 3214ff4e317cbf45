use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qascreen_core::ScreenConfig;
use qascreen_runner::{init_logging, run};

#[derive(Parser, Debug)]
#[command(name = "qascreen")]
#[command(about = "Runs a stress workload and records cluster metrics while it runs", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file; `QASCREEN_CONFIG` is also honored
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override `polling.interval_ms`
    #[arg(long, env = "QASCREEN_INTERVAL_MS")]
    interval_ms: Option<u64>,

    /// Override `logging.level`
    #[arg(long, env = "QASCREEN_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ScreenConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(interval_ms) = cli.interval_ms {
        config.polling.interval_ms = interval_ms;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.validate().context("invalid configuration")?;

    init_logging(&config.logging)?;

    let summary = run(&config).await?;
    if !summary.workload_succeeded {
        tracing::warn!(run_id = %summary.run_id, "Screen completed but the workload failed");
    }

    Ok(())
}
