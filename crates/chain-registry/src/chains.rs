//! Chain definitions

use serde::{Deserialize, Serialize};
use serde_json::json;
use terpdash_core::Address;

/// How transactions on a chain are signed.
///
/// Selected once from static configuration; the transfer flow dispatches on
/// this instead of comparing chain names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SigningFamily {
    /// Standard Cosmos-SDK secp256k1 account, amino JSON signing
    Amino,
    /// Ethermint-style account: eth_secp256k1 key, direct signing with the
    /// wallet's Ethereum flag
    Ethermint {
        /// Type URL wrapping the public key in `SignerInfo`
        pubkey_type_url: String,
        /// EIP-155 chain id (ignored by some Ethermint forks)
        eip155_chain_id: u64,
    },
}

impl SigningFamily {
    pub fn ethermint(pubkey_type_url: &str, eip155_chain_id: u64) -> Self {
        Self::Ethermint {
            pubkey_type_url: pubkey_type_url.to_string(),
            eip155_chain_id,
        }
    }

    pub fn is_ethermint(&self) -> bool {
        matches!(self, Self::Ethermint { .. })
    }
}

/// Currency descriptor (as the wallet extension expects it)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub coin_denom: String,
    pub coin_minimal_denom: String,
    pub coin_decimals: u32,
}

impl Currency {
    pub fn new(display: &str, minimal: &str, decimals: u32) -> Self {
        Self {
            coin_denom: display.to_string(),
            coin_minimal_denom: minimal.to_string(),
            coin_decimals: decimals,
        }
    }
}

/// A chain the bridge can talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub chain_name: String,
    pub chain_id: String,
    pub lcd: String,
    pub rpc: String,
    pub bech32_prefix: String,
    /// Channel on this chain that leads to the home chain
    pub deposit_channel_id: String,
    /// Channel on the home chain that leads to this chain
    pub withdraw_channel_id: String,
    pub deposit_gas: u64,
    pub withdraw_gas: u64,
    pub gas_denom: String,
    pub gas_price: f64,
    /// Account explorer URL; the address is appended
    pub explorer_account: String,
    pub chain_image: String,
    pub coin_type: u32,
    pub family: SigningFamily,
    /// Staking currency, used when suggesting the chain to the wallet
    pub stake_currency: Currency,
    /// The wallet extension may not know this chain; suggest it before enabling
    pub needs_suggestion: bool,
}

impl Chain {
    /// Explorer link for an account on this chain
    pub fn explorer_account_url(&self, address: &str) -> String {
        format!("{}{}", self.explorer_account, address)
    }

    /// Whether `address` belongs to this chain's bech32 namespace
    pub fn owns_address(&self, address: &Address) -> bool {
        address.has_prefix(&self.bech32_prefix)
    }

    /// Fee amount for `gas` units at this chain's gas price, rounded up
    pub fn fee_for_gas(&self, gas: u64) -> u128 {
        (gas as f64 * self.gas_price).ceil() as u128
    }

    /// Chain description in the wallet extension's suggest-chain format
    pub fn wallet_chain_info(&self) -> serde_json::Value {
        let p = &self.bech32_prefix;
        let stake = currency_json(&self.stake_currency);
        let gas_currency = if self.gas_denom == self.stake_currency.coin_minimal_denom {
            stake.clone()
        } else {
            json!({
                "coinDenom": self.gas_denom,
                "coinMinimalDenom": self.gas_denom,
                "coinDecimals": self.stake_currency.coin_decimals,
            })
        };
        let mut fee_currency = gas_currency.clone();
        fee_currency["gasPriceStep"] = json!({
            "low": self.gas_price,
            "average": self.gas_price * 1.25,
            "high": self.gas_price * 1.5,
        });

        json!({
            "chainId": self.chain_id,
            "chainName": self.chain_name,
            "rpc": self.rpc,
            "rest": self.lcd,
            "bip44": { "coinType": self.coin_type },
            "bech32Config": {
                "bech32PrefixAccAddr": p,
                "bech32PrefixAccPub": format!("{p}pub"),
                "bech32PrefixValAddr": format!("{p}valoper"),
                "bech32PrefixValPub": format!("{p}valoperpub"),
                "bech32PrefixConsAddr": format!("{p}valcons"),
                "bech32PrefixConsPub": format!("{p}valconspub"),
            },
            "currencies": [stake],
            "feeCurrencies": [fee_currency],
            "stakeCurrency": currency_json(&self.stake_currency),
            "features": if self.family.is_ethermint() {
                json!(["eth-address-gen", "eth-key-sign"])
            } else {
                json!([])
            },
        })
    }
}

fn currency_json(c: &Currency) -> serde_json::Value {
    json!({
        "coinDenom": c.coin_denom,
        "coinMinimalDenom": c.coin_minimal_denom,
        "coinDecimals": c.coin_decimals,
    })
}
