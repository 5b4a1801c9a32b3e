use anyhow::Result;
use clap::Parser;

use autonet_core::config::{AutonetConfig, GeneralConfig};
use autonet_daemon::cli::DaemonCli;
use autonet_daemon::logging;
use autonet_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 로깅 설정은 규칙보다 먼저 읽어 설정 경고도 기록되게 함
    let mut general = GeneralConfig::from_env();
    cli.apply_overrides(&mut general);
    general
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid logging configuration: {}", e))?;
    logging::init_tracing(&general)?;

    let mut config = match AutonetConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "configuration rejected");
            return Err(anyhow::anyhow!("configuration error: {}", e));
        }
    };
    config.general = general;

    if cli.validate {
        println!("{}", serde_json::to_string_pretty(&config)?);
        tracing::info!(rules = config.rules.len(), "configuration is valid");
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "autonet-daemon starting");

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("autonet-daemon shut down");
    Ok(())
}
