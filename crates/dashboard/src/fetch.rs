//! Public market-data sources: chain-info, CoinGecko, DefiLlama, app directory

use std::time::Duration;

use serde_json::Value;
use terpdash_core::{MarketConfig, MetricsError};

use crate::state::{number, ChainInfo, MarketChart, SimplePrice};

/// Default timeout for market-data calls (30 seconds).
const MARKET_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type Result<T> = std::result::Result<T, MetricsError>;

/// HTTP client for the dashboard's third-party data sources
#[derive(Debug, Clone)]
pub struct MarketClient {
    http: reqwest::Client,
    config: MarketConfig,
    timeout: Duration,
}

impl MarketClient {
    pub fn new(http: reqwest::Client, config: MarketConfig) -> Self {
        Self {
            http,
            config,
            timeout: MARKET_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    async fn get_json(
        &self,
        source_name: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let fetch_err = |message: String| MetricsError::Fetch {
            source_name,
            message,
        };

        let request = self.http.get(url).query(query).send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| fetch_err(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status.as_u16())));
        }
        response.json().await.map_err(|e| MetricsError::Parse {
            source_name,
            message: e.to_string(),
        })
    }

    /// Inflation, supply, taxes and bond rate from the chain-info aggregator
    pub async fn chain_info(&self) -> Result<ChainInfo> {
        let body = self
            .get_json("chain-info", &self.config.chain_info_url, &[])
            .await?;
        Ok(ChainInfo::from_json(&body))
    }

    /// USD price history over the last `days` days
    pub async fn market_chart(&self, days: u32) -> Result<MarketChart> {
        let url = format!(
            "{}/coins/{}/market_chart",
            self.config.coingecko_url.trim_end_matches('/'),
            self.config.coingecko_id
        );
        let body = self
            .get_json(
                "coingecko",
                &url,
                &[("vs_currency", "usd".to_string()), ("days", days.to_string())],
            )
            .await?;
        let chart = MarketChart::from_json(&body);
        if chart.prices.is_empty() {
            return Err(MetricsError::Parse {
                source_name: "coingecko",
                message: "market chart has no prices".to_string(),
            });
        }
        Ok(chart)
    }

    /// Current USD price, market cap and 24h volume
    pub async fn simple_price(&self) -> Result<SimplePrice> {
        let url = format!(
            "{}/simple/price",
            self.config.coingecko_url.trim_end_matches('/')
        );
        let body = self
            .get_json(
                "coingecko",
                &url,
                &[
                    ("ids", self.config.coingecko_id.clone()),
                    ("vs_currencies", "usd".to_string()),
                    ("include_market_cap", "true".to_string()),
                    ("include_24hr_vol", "true".to_string()),
                ],
            )
            .await?;
        let entry = body
            .get(&self.config.coingecko_id)
            .ok_or_else(|| MetricsError::Parse {
                source_name: "coingecko",
                message: format!("no price for {}", self.config.coingecko_id),
            })?;
        Ok(SimplePrice {
            usd: number(&entry["usd"]),
            usd_market_cap: number(&entry["usd_market_cap"]),
            usd_24h_vol: number(&entry["usd_24h_vol"]),
        })
    }

    /// Historical TVL as `[timestamp_ms, tvl_usd]`
    pub async fn tvl(&self) -> Result<Vec<(i64, f64)>> {
        let url = format!(
            "{}/charts/{}",
            self.config.defillama_url.trim_end_matches('/'),
            self.config.defillama_chain
        );
        let body = self.get_json("defillama", &url, &[]).await?;
        let points = body.as_array().ok_or_else(|| MetricsError::Parse {
            source_name: "defillama",
            message: "expected an array".to_string(),
        })?;
        Ok(points
            .iter()
            .filter_map(|p| {
                let date = number(&p["date"])?;
                let tvl = number(&p["totalLiquidityUSD"])?;
                Some((date as i64 * 1000, tvl))
            })
            .collect())
    }

    /// Raw app-directory listing
    pub async fn apps(&self) -> Result<Value> {
        self.get_json("apps", &self.config.apps_url, &[]).await
    }
}
