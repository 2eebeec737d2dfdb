//! Dashboard: chain and market metrics plus the app directory
//!
//! Metrics come from independent public sources fetched concurrently; each
//! source fills its own field and a failed one simply stays empty. Derived
//! figures (APR, percentages, staking breakdown) are recomputed from whatever
//! is present.

pub mod aggregator;
pub mod apps;
pub mod calculator;
pub mod fetch;
pub mod state;

pub use aggregator::MetricsAggregator;
pub use apps::{load_with_retry, spawn_loader, AppDirectory, AppEntry, APPS_RETRY_INTERVAL};
pub use calculator::{apr, format_number, format_percent, StakingBreakdown};
pub use fetch::MarketClient;
pub use state::{ChainInfo, DashboardMetrics, DerivedMetrics, MarketChart, SimplePrice};
