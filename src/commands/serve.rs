use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::config::{Config, DEFAULT_CONFIG_PATH};

pub fn run(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
    log_level: Option<String>,
) -> Result<()> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    // A broken config file must not keep the dashboard down.
    let (mut config, load_error) = Config::load_or_default(&path);

    // CLI flags override config values
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(level) = log_level {
        config.log_level = level;
    }

    crate::server::init_tracing(&config.log_level);
    if let Some(e) = load_error {
        warn!(
            path = %path.display(),
            error = %e,
            "failed to parse config file, continuing with defaults"
        );
    }

    // Build tokio runtime explicitly (no #[tokio::main] on fn main)
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(crate::server::run(config))
}
