//! Configuration types for terpdash

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Public market-data endpoints used by the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Chain-info aggregator (inflation, supply, taxes, bond rate)
    pub chain_info_url: String,

    /// CoinGecko API base URL
    pub coingecko_url: String,

    /// CoinGecko coin id of the home token
    pub coingecko_id: String,

    /// DefiLlama API base URL
    pub defillama_url: String,

    /// DefiLlama chain slug
    pub defillama_chain: String,

    /// App directory listing
    pub apps_url: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chain_info_url: "https://core.spartanapi.dev/terp/chains/morocco-1/chain_info"
                .to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            coingecko_id: "terp-network".to_string(),
            defillama_url: "https://api.llama.fi".to_string(),
            defillama_chain: "terp".to_string(),
            apps_url: "https://api.terp.network/api/dapps?populate=*".to_string(),
        }
    }
}

/// Fee-grant faucet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaucetConfig {
    /// Faucet endpoint that grants fee allowances
    pub url: String,

    /// Granter address used as `fee.granter` once a grant succeeded
    pub address: String,
}

impl Default for FaucetConfig {
    fn default() -> Self {
        Self {
            url: "https://faucet.terp.network/claim".to_string(),
            address: "terp1ncj7w5ycafgwq2d3tq8vdg4u9wwwq0kxlc9shm".to_string(),
        }
    }
}

/// Polling cadence for balances and IBC acknowledgements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Balance refresh interval (milliseconds)
    pub balance_interval_ms: u64,

    /// Acknowledgement check interval (milliseconds)
    pub ack_interval_ms: u64,

    /// Give up waiting for an acknowledgement after this long (milliseconds)
    pub ack_timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            balance_interval_ms: 10_000,
            ack_interval_ms: 10_000,
            ack_timeout_ms: 615_000,
        }
    }
}

impl PollConfig {
    pub fn balance_interval(&self) -> Duration {
        Duration::from_millis(self.balance_interval_ms)
    }

    pub fn ack_interval(&self) -> Duration {
        Duration::from_millis(self.ack_interval_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Reject zero intervals
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [
            ("balance_interval_ms", self.balance_interval_ms),
            ("ack_interval_ms", self.ack_interval_ms),
            ("ack_timeout_ms", self.ack_timeout_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("poll.{} must be greater than 0", name)));
            }
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Wallet bridge page server port (0 = pick a free port)
    #[serde(default)]
    pub wallet_bridge_port: u16,

    /// Override for the home chain LCD URL
    #[serde(default)]
    pub home_lcd_url: Option<String>,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub faucet: FaucetConfig,

    #[serde(default)]
    pub poll: PollConfig,

    /// Permit more than one transfer in flight per session
    #[serde(default)]
    pub allow_concurrent_transfers: bool,
}

fn default_api_port() -> u16 {
    19317
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            wallet_bridge_port: 0,
            home_lcd_url: None,
            market: MarketConfig::default(),
            faucet: FaucetConfig::default(),
            poll: PollConfig::default(),
            allow_concurrent_transfers: false,
        }
    }
}

impl AppConfig {
    /// Parse a TOML document; missing fields fall back to defaults
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.poll.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }
}
