//! terpdash application library

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use terpdash_api::{start_server, AppState};
use terpdash_core::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "terpdash", version, about = "Terp Network dashboard and IBC bridge backend")]
pub struct Cli {
    /// TOML configuration file; defaults apply when absent
    #[arg(long, env = "TERPDASH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the API port from the configuration
    #[arg(long)]
    pub port: Option<u16>,
}

/// Load configuration from `path`, or defaults without one
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(AppConfig::default()),
    }
}

/// Debug output for every workspace crate, info for dependencies
pub const DEFAULT_LOG_DIRECTIVES: &str = "terpdash=debug,terpdash_api=debug,ibc_transfer=debug,\
wallet_bridge=debug,lcd_client=debug,dashboard=debug,chain_registry=debug,ibc_tx=debug,info";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_DIRECTIVES));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the API server until Ctrl-C
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing();

    let mut config = load_config(cli.config.as_ref())?;
    if let Some(port) = cli.port {
        config.api_port = port;
    }
    let port = config.api_port;

    tracing::info!("Starting terpdash");

    let state = AppState::new(config)
        .await
        .context("initialising application state")?;
    state.start_background().await;

    let served = start_server(state.clone(), port, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    })
    .await;

    state.shutdown().await;
    served.context("API server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_config_and_port() {
        let cli = Cli::try_parse_from(["terpdash", "--config", "/tmp/terpdash.toml", "--port", "8080"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/terpdash.toml")));
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.api_port, 19317);
        assert!(load_config(Some(&PathBuf::from("/nonexistent/terpdash.toml"))).is_err());
    }

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES).is_ok());
        let directives: Vec<_> = DEFAULT_LOG_DIRECTIVES.split(',').collect();
        for target in [
            "terpdash",
            "terpdash_api",
            "ibc_transfer",
            "wallet_bridge",
            "lcd_client",
            "dashboard",
            "chain_registry",
            "ibc_tx",
        ] {
            assert!(directives.contains(&format!("{}=debug", target).as_str()), "{}", target);
        }
        assert_eq!(directives.last(), Some(&"info"));
    }
}
