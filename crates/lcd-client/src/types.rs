//! Response types for the Cosmos REST endpoints we read

use serde::{Deserialize, Deserializer, Serialize};

use terpdash_core::RawAmount;

/// Cosmos-SDK encodes 64-bit integers as JSON strings; accept both forms.
pub(crate) fn u64_from_str_or_num<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) if s.is_empty() => Ok(0),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Bank coin (integer amount)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: RawAmount) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }

    /// Parsed amount; malformed values count as zero
    pub fn raw_amount(&self) -> RawAmount {
        self.amount.parse().unwrap_or(0)
    }
}

/// Decimal coin as returned by the distribution module (`"123.450000000000000000"`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: String,
}

impl DecCoin {
    /// Integer part of the amount
    pub fn whole_amount(&self) -> RawAmount {
        self.amount
            .split('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalancesResponse {
    #[serde(default)]
    pub balances: Vec<Coin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SupplyResponse {
    pub amount: Coin,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommunityPoolResponse {
    #[serde(default)]
    pub pool: Vec<DecCoin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StakingPoolResponse {
    pub pool: StakingPool,
}

/// Bonded / not-bonded token totals of the staking module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingPool {
    pub bonded_tokens: String,
    pub not_bonded_tokens: String,
}

impl StakingPool {
    pub fn bonded(&self) -> RawAmount {
        self.bonded_tokens.parse().unwrap_or(0)
    }

    pub fn not_bonded(&self) -> RawAmount {
        self.not_bonded_tokens.parse().unwrap_or(0)
    }
}

/// Account number, sequence and (if the account has signed before) public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub account_number: u64,
    pub sequence: u64,
    /// Base64 key bytes from `pub_key.key`
    pub pub_key: Option<String>,
}

impl AccountInfo {
    /// Extract from the `account` object of `/cosmos/auth/v1beta1/accounts/{addr}`
    ///
    /// Plain accounts carry the fields at the top level. `EthAccount` nests them
    /// under `base_account`; vesting accounts under
    /// `base_vesting_account.base_account`.
    pub fn from_account_json(account: &serde_json::Value) -> Option<Self> {
        let base = account
            .get("base_account")
            .or_else(|| {
                account
                    .get("base_vesting_account")
                    .and_then(|v| v.get("base_account"))
            })
            .unwrap_or(account);

        let number = |v: &serde_json::Value| -> Option<u64> {
            match v {
                serde_json::Value::String(s) => s.parse().ok(),
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::Null => Some(0),
                _ => None,
            }
        };

        Some(Self {
            address: base.get("address")?.as_str()?.to_string(),
            account_number: number(base.get("account_number").unwrap_or(&serde_json::Value::Null))?,
            sequence: number(base.get("sequence").unwrap_or(&serde_json::Value::Null))?,
            pub_key: base
                .get("pub_key")
                .and_then(|k| k.get("key"))
                .and_then(|k| k.as_str())
                .map(str::to_string),
        })
    }
}

/// ABCI event attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// ABCI event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciMessageLog {
    #[serde(default)]
    pub events: Vec<Event>,
}

/// Transaction result as reported by `/cosmos/tx/v1beta1/txs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    #[serde(default, deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub logs: Vec<AbciMessageLog>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TxResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// First value of `key` in an event of type `event_type`
    ///
    /// Looks at the flat event list first and falls back to per-message logs
    /// (older nodes only populate the latter with readable keys).
    pub fn find_attribute(&self, event_type: &str, key: &str) -> Option<&str> {
        let from_logs = self.logs.iter().flat_map(|l| l.events.iter());
        self.events
            .iter()
            .chain(from_logs)
            .filter(|e| e.kind == event_type)
            .flat_map(|e| e.attributes.iter())
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxEnvelope {
    pub tx_response: TxResponse,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TxSearchResponse {
    #[serde(default)]
    pub tx_responses: Vec<TxResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SmartQueryResponse {
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatestBlockResponse {
    pub block: Block,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockHeader {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    #[serde(default)]
    pub chain_id: String,
}

/// Cosmos gRPC-gateway error body
#[derive(Debug, Deserialize)]
pub(crate) struct GatewayError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_account_nesting() {
        let plain = json!({
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "address": "terp1abc",
            "pub_key": {"@type": "/cosmos.crypto.secp256k1.PubKey", "key": "A1B2"},
            "account_number": "42",
            "sequence": "7"
        });
        let info = AccountInfo::from_account_json(&plain).unwrap();
        assert_eq!(info.account_number, 42);
        assert_eq!(info.sequence, 7);
        assert_eq!(info.pub_key.as_deref(), Some("A1B2"));

        let eth = json!({
            "@type": "/ethermint.types.v1.EthAccount",
            "base_account": {
                "address": "evmos1abc",
                "pub_key": null,
                "account_number": "1001",
                "sequence": "0"
            },
            "code_hash": "0xc5d2"
        });
        let info = AccountInfo::from_account_json(&eth).unwrap();
        assert_eq!(info.address, "evmos1abc");
        assert_eq!(info.account_number, 1001);
        assert!(info.pub_key.is_none());
    }

    #[test]
    fn test_find_attribute_prefers_events_then_logs() {
        let tx: TxResponse = serde_json::from_value(json!({
            "height": "100",
            "txhash": "ABC",
            "code": 0,
            "raw_log": "",
            "logs": [{"events": [{"type": "send_packet", "attributes": [
                {"key": "packet_sequence", "value": "9"}
            ]}]}],
            "events": []
        }))
        .unwrap();
        assert_eq!(tx.height, 100);
        assert_eq!(tx.find_attribute("send_packet", "packet_sequence"), Some("9"));
        assert_eq!(tx.find_attribute("send_packet", "packet_src_channel"), None);
    }

    #[test]
    fn test_dec_coin_whole_amount() {
        let coin = DecCoin {
            denom: "uterp".into(),
            amount: "12345.678900000000000000".into(),
        };
        assert_eq!(coin.whole_amount(), 12345);
    }
}
