//! Dashboard data model

use serde::Serialize;
use serde_json::Value;

use crate::calculator::{
    apr, format_block_time, format_height, format_number, format_percent, StakingBreakdown,
};

/// Figures from the chain-info aggregator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChainInfo {
    pub inflation: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub avg_block_time: Option<f64>,
    pub tx_volume: Option<f64>,
    pub community_tax: Option<f64>,
    pub foundation_tax: Option<f64>,
    pub fees_paid: Option<f64>,
    /// Bonded share of the supply, in percent
    pub bond_rate: Option<f64>,
}

impl ChainInfo {
    /// Pick the known fields out of a chain-info payload
    ///
    /// Numbers arrive either as JSON numbers or as decimal strings.
    pub fn from_json(value: &Value) -> Self {
        let params = &value["staking_params"];
        Self {
            inflation: number(&value["inflation"]),
            circulating_supply: number(&value["circulating_supply"]),
            avg_block_time: number(&value["avg_block_time"]),
            tx_volume: number(&value["tx_volume"]),
            community_tax: number(&params["community_tax"]),
            foundation_tax: number(&params["foundation_tax"])
                .or_else(|| number(&params["secret_foundation_tax"])),
            fees_paid: number(&value["fees_paid"]),
            bond_rate: number(&value["bond_rate"]),
        }
    }
}

pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `[timestamp_ms, value]` series of one CoinGecko `market_chart` window
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketChart {
    pub prices: Vec<(i64, f64)>,
    pub market_caps: Vec<(i64, f64)>,
    pub total_volumes: Vec<(i64, f64)>,
}

impl MarketChart {
    pub fn from_json(value: &Value) -> Self {
        Self {
            prices: series(&value["prices"]),
            market_caps: series(&value["market_caps"]),
            total_volumes: series(&value["total_volumes"]),
        }
    }

    pub fn last_price(&self) -> Option<f64> {
        self.prices.last().map(|(_, p)| *p)
    }
}

fn series(value: &Value) -> Vec<(i64, f64)> {
    value
        .as_array()
        .map(|points| {
            points
                .iter()
                .filter_map(|p| Some((p.get(0)?.as_f64()? as i64, p.get(1)?.as_f64()?)))
                .collect()
        })
        .unwrap_or_default()
}

/// Spot figures from CoinGecko `simple/price`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimplePrice {
    pub usd: Option<f64>,
    pub usd_market_cap: Option<f64>,
    pub usd_24h_vol: Option<f64>,
}

/// Everything the dashboard fetched; a source that failed leaves its field empty
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardMetrics {
    pub chain_info: Option<ChainInfo>,
    pub price: Option<SimplePrice>,
    pub chart_day: Option<MarketChart>,
    pub chart_month: Option<MarketChart>,
    pub chart_year: Option<MarketChart>,
    /// `[timestamp_ms, tvl_usd]`
    pub tvl: Option<Vec<(i64, f64)>>,
    pub latest_height: Option<u64>,
    pub community_pool: Option<u128>,
    pub total_supply: Option<u128>,
    pub bonded_tokens: Option<u128>,
    /// Unix seconds of the last refresh
    pub updated_at: Option<u64>,
}

/// Display-ready figures computed from `DashboardMetrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub apr: Option<f64>,
    pub apr_formatted: Option<String>,
    pub inflation_formatted: Option<String>,
    pub community_tax_formatted: Option<String>,
    pub foundation_tax_formatted: Option<String>,
    pub block_time_formatted: Option<String>,
    pub block_height_formatted: Option<String>,
    pub circulating_supply_formatted: Option<String>,
    pub staking: Option<StakingBreakdown>,
    pub staking_labels: Option<[String; 3]>,
}

impl DashboardMetrics {
    /// Recompute the derived figures for `decimals`-decimal home tokens
    pub fn derived(&self, decimals: u32) -> DerivedMetrics {
        let info = self.chain_info.clone().unwrap_or_default();
        let price = self.price.clone().unwrap_or_default();

        let apr = match (info.inflation, info.bond_rate, info.foundation_tax, info.community_tax) {
            (Some(i), Some(b), Some(f), Some(c)) => apr(i, b, f, c),
            _ => None,
        };

        let staking = match (self.total_supply, self.bonded_tokens, self.community_pool) {
            (Some(total), Some(bonded), Some(pool)) => {
                StakingBreakdown::compute(total, bonded, pool, decimals)
            }
            _ => None,
        };

        DerivedMetrics {
            current_price: price
                .usd
                .or_else(|| self.chart_month.as_ref().and_then(MarketChart::last_price)),
            market_cap: price.usd_market_cap,
            volume_24h: price.usd_24h_vol,
            apr,
            apr_formatted: apr.map(format_percent),
            inflation_formatted: info.inflation.map(format_percent),
            community_tax_formatted: info.community_tax.map(format_percent),
            foundation_tax_formatted: info.foundation_tax.map(format_percent),
            block_time_formatted: info.avg_block_time.map(format_block_time),
            block_height_formatted: self.latest_height.map(format_height),
            circulating_supply_formatted: info.circulating_supply.map(|s| format_number(s, 2)),
            staking_labels: staking.as_ref().map(StakingBreakdown::labels),
            staking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chain_info_accepts_strings_and_numbers() {
        let info = ChainInfo::from_json(&json!({
            "inflation": 0.15,
            "circulating_supply": "1500000",
            "avg_block_time": 5.8,
            "staking_params": {"community_tax": "0.02", "foundation_tax": 0.02},
            "bond_rate": 40
        }));
        assert_eq!(info.inflation, Some(0.15));
        assert_eq!(info.circulating_supply, Some(1_500_000.0));
        assert_eq!(info.community_tax, Some(0.02));
        assert_eq!(info.bond_rate, Some(40.0));
        assert_eq!(info.fees_paid, None);
    }

    #[test]
    fn test_derived_from_partial_inputs() {
        let mut metrics = DashboardMetrics {
            latest_height: Some(1_234_567),
            ..Default::default()
        };
        let derived = metrics.derived(6);
        assert_eq!(derived.block_height_formatted.as_deref(), Some("1,234,567"));
        assert_eq!(derived.apr, None);
        assert_eq!(derived.current_price, None);

        metrics.chain_info = Some(ChainInfo {
            inflation: Some(0.15),
            bond_rate: Some(40.0),
            foundation_tax: Some(0.02),
            community_tax: Some(0.02),
            circulating_supply: Some(1_500_000.0),
            ..Default::default()
        });
        metrics.chart_month = Some(MarketChart::from_json(&json!({
            "prices": [[1700000000000i64, 0.010], [1700003600000i64, 0.012]]
        })));
        let derived = metrics.derived(6);
        assert!((derived.apr.unwrap() - 0.342).abs() < 1e-9);
        assert_eq!(derived.inflation_formatted.as_deref(), Some("15%"));
        assert_eq!(derived.circulating_supply_formatted.as_deref(), Some("1.5M"));
        assert_eq!(derived.current_price, Some(0.012));
        assert!(derived.staking.is_none());
    }
}
