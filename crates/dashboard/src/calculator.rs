//! Derived dashboard figures

use serde::Serialize;

/// Median validator commission assumed by the APR estimate
pub const ASSUMED_COMMISSION: f64 = 0.05;

/// Magnitude suffixes, one per factor of 1000
const COUNT_ABBRS: [&str; 18] = [
    "", "K", "M", "B", "t", "q", "s", "S", "o", "n", "d", "U", "D", "T", "Qt", "Qd", "Sd", "St",
];

/// Estimated staking APR
///
/// `bonded_ratio_pct` is a percentage (40 means 40% bonded). `None` when
/// nothing is bonded.
pub fn apr(inflation: f64, bonded_ratio_pct: f64, foundation_tax: f64, community_tax: f64) -> Option<f64> {
    let bonded = bonded_ratio_pct / 100.0;
    if bonded <= 0.0 || !bonded.is_finite() {
        return None;
    }
    Some((inflation / bonded) * (1.0 - foundation_tax - community_tax) * (1.0 - ASSUMED_COMMISSION))
}

/// Abbreviate `n` with a magnitude suffix: `1_500_000` becomes `"1.5M"`
///
/// The scaled value is rounded to `decimals` places and trailing zeros are
/// dropped.
pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let mut scaled = n.abs();
    let mut tier = 0;
    while scaled >= 1000.0 && tier < COUNT_ABBRS.len() - 1 {
        scaled /= 1000.0;
        tier += 1;
    }
    let sign = if n < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, trim_decimals(scaled, decimals), COUNT_ABBRS[tier])
}

/// Ratio as a percentage string: `0.02` becomes `"2%"`
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", trim_decimals(ratio * 100.0, 4))
}

pub fn format_block_time(secs: f64) -> String {
    format!("{}s", trim_decimals(secs, 2))
}

/// Block height with thousands separators
pub fn format_height(height: u64) -> String {
    let digits = height.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Round to `decimals` places and drop trailing zeros
fn trim_decimals(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    match fixed.parse::<f64>() {
        Ok(v) => v.to_string(),
        Err(_) => fixed,
    }
}

/// Staked / unstaked / community-pool split of the total supply, in whole tokens
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakingBreakdown {
    pub total_supply: f64,
    pub staked: f64,
    pub unstaked: f64,
    pub community_pool: f64,
    pub staked_pct: f64,
    pub unstaked_pct: f64,
    pub community_pool_pct: f64,
}

impl StakingBreakdown {
    /// Split from base-unit totals; `None` when the supply is zero
    pub fn compute(total_supply: u128, bonded: u128, community_pool: u128, decimals: u32) -> Option<Self> {
        if total_supply == 0 {
            return None;
        }
        let scale = 10f64.powi(decimals as i32);
        let total = total_supply as f64 / scale;
        let staked = bonded as f64 / scale;
        let pool = community_pool as f64 / scale;
        let unstaked = (total - staked - pool).max(0.0);
        let pct = |part: f64| (part / total * 10_000.0).round() / 100.0;
        Some(Self {
            total_supply: total,
            staked,
            unstaked,
            community_pool: pool,
            staked_pct: pct(staked),
            unstaked_pct: pct(unstaked),
            community_pool_pct: pct(pool),
        })
    }

    /// Chart legend entries
    pub fn labels(&self) -> [String; 3] {
        [
            format!("Staked: {} ({:.2}%)", format_number(self.staked, 2), self.staked_pct),
            format!("Unstaked: {} ({:.2}%)", format_number(self.unstaked, 2), self.unstaked_pct),
            format!(
                "Community Pool: {} ({:.2}%)",
                format_number(self.community_pool, 2),
                self.community_pool_pct
            ),
        ]
    }
}
