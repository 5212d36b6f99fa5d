use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config, load_local_env_overrides, warn_incomplete, LoadedConfig};
use crate::metrics;

pub async fn run() -> Result<()> {
    load_local_env_overrides();
    let cli = CliArgs::parse();

    let LoadedConfig {
        config,
        path,
        from_file,
    } = load_config(cli.config.as_ref()).await?;
    init_logging(&cli.log_level, cli.debug, &config.paths.logs)?;
    let _metrics_server = metrics::spawn_metrics_server(cli.metrics_port);

    info!("Starting firco-disposition v{}", env!("CARGO_PKG_VERSION"));
    if from_file {
        info!("Loaded configuration from: {}", path.display());
    } else {
        warn!("Config file not found, using defaults: {}", path.display());
    }
    warn_incomplete(&config);

    let cli_context = CliContext::new(config, path);
    match dispatch(&cli, &cli_context).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {:#}", err);
            Err(err)
        }
    }
}
