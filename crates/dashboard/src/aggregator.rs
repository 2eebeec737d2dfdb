//! Concurrent metrics refresh

use std::time::{SystemTime, UNIX_EPOCH};

use lcd_client::LcdClient;
use terpdash_core::MetricsError;
use tokio::sync::RwLock;

use crate::fetch::MarketClient;
use crate::state::{DashboardMetrics, DerivedMetrics};

/// Collects dashboard metrics from every source
///
/// A refresh fetches all sources concurrently. A source that fails is logged
/// and keeps whatever value it had before.
pub struct MetricsAggregator {
    market: MarketClient,
    lcd: LcdClient,
    stake_denom: String,
    decimals: u32,
    metrics: RwLock<DashboardMetrics>,
}

impl MetricsAggregator {
    pub fn new(market: MarketClient, lcd: LcdClient, stake_denom: impl Into<String>, decimals: u32) -> Self {
        Self {
            market,
            lcd,
            stake_denom: stake_denom.into(),
            decimals,
            metrics: RwLock::new(DashboardMetrics::default()),
        }
    }

    pub async fn snapshot(&self) -> DashboardMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn derived(&self) -> DerivedMetrics {
        self.metrics.read().await.derived(self.decimals)
    }

    /// Fetch every source once; returns how many failed
    pub async fn refresh(&self) -> usize {
        let (info, price, day, month, year, tvl, height, pool, supply, staking) = tokio::join!(
            self.market.chain_info(),
            self.market.simple_price(),
            self.market.market_chart(1),
            self.market.market_chart(30),
            self.market.market_chart(365),
            self.market.tvl(),
            self.lcd.latest_block_height(),
            self.lcd.community_pool(),
            self.lcd.supply_of(&self.stake_denom),
            self.lcd.staking_pool(),
        );

        let pool = pool.map(|coins| {
            coins
                .iter()
                .find(|c| c.denom == self.stake_denom)
                .map(|c| c.whole_amount())
                .unwrap_or(0)
        });

        let mut failed = 0;
        let mut metrics = self.metrics.write().await;
        keep_ok(&mut metrics.chain_info, info, "chain info", &mut failed);
        keep_ok(&mut metrics.price, price, "price", &mut failed);
        keep_ok(&mut metrics.chart_day, day, "1d chart", &mut failed);
        keep_ok(&mut metrics.chart_month, month, "30d chart", &mut failed);
        keep_ok(&mut metrics.chart_year, year, "365d chart", &mut failed);
        keep_ok(&mut metrics.tvl, tvl, "tvl", &mut failed);
        keep_ok(&mut metrics.latest_height, height.map_err(MetricsError::from), "block height", &mut failed);
        keep_ok(&mut metrics.community_pool, pool.map_err(MetricsError::from), "community pool", &mut failed);
        keep_ok(&mut metrics.total_supply, supply.map_err(MetricsError::from), "total supply", &mut failed);
        keep_ok(
            &mut metrics.bonded_tokens,
            staking.map(|p| p.bonded()).map_err(MetricsError::from),
            "staking pool",
            &mut failed,
        );
        metrics.updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());

        if failed > 0 {
            tracing::info!(failed, "Dashboard refresh finished with missing sources");
        } else {
            tracing::debug!("Dashboard refresh complete");
        }
        failed
    }
}

fn keep_ok<T>(slot: &mut Option<T>, result: Result<T, MetricsError>, what: &str, failed: &mut usize) {
    match result {
        Ok(value) => *slot = Some(value),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch {}", what);
            *failed += 1;
        }
    }
}
