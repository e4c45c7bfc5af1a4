//! Tracing subscriber setup

use crate::config::LoggingConfig;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "fraud_scoring_service={level},tower_http={level}",
            level = config.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.format.eq_ignore_ascii_case("json") {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
