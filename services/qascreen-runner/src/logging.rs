use anyhow::anyhow;
use qascreen_core::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("invalid logging.level `{}`: {}", config.level, e))?,
    };

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}
