//! Token definitions and their per-chain channel bindings

use serde::{Deserialize, Serialize};

/// Smart-contract token coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: String,
    pub code_hash: String,
}

/// Whether a token is a bank denomination or lives in a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenKind {
    Native,
    /// Balance queries need a viewing key; withdrawals go through the
    /// ICS-20 gateway contract instead of `MsgTransfer`.
    Contract(ContractInfo),
}

/// One route a token can travel over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    /// Counterparty chain name
    pub chain_name: String,
    /// Denom on the sending side
    pub from_denom: String,
    /// Overrides the chain's default channel
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Overrides the chain's default gas
    #[serde(default)]
    pub gas: Option<u64>,
}

impl ChannelBinding {
    pub fn new(chain_name: &str, from_denom: &str) -> Self {
        Self {
            chain_name: chain_name.to_string(),
            from_denom: from_denom.to_string(),
            channel_id: None,
            gas: None,
        }
    }

    pub fn with_channel(mut self, channel_id: &str) -> Self {
        self.channel_id = Some(channel_id.to_string());
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// A bridgeable token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub description: String,
    pub image: String,
    pub decimals: u32,
    pub kind: TokenKind,
    pub deposits: Vec<ChannelBinding>,
    pub withdrawals: Vec<ChannelBinding>,
}

impl Token {
    pub fn is_contract(&self) -> bool {
        matches!(self.kind, TokenKind::Contract(_))
    }

    pub fn contract(&self) -> Option<&ContractInfo> {
        match &self.kind {
            TokenKind::Contract(info) => Some(info),
            TokenKind::Native => None,
        }
    }

    /// Deposit route from `chain_name` (case-insensitive)
    pub fn deposit_binding(&self, chain_name: &str) -> Option<&ChannelBinding> {
        self.deposits
            .iter()
            .find(|d| d.chain_name.eq_ignore_ascii_case(chain_name))
    }

    /// Withdrawal route to `chain_name` (case-insensitive)
    pub fn withdrawal_binding(&self, chain_name: &str) -> Option<&ChannelBinding> {
        self.withdrawals
            .iter()
            .find(|w| w.chain_name.eq_ignore_ascii_case(chain_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Token {
        Token {
            name: "TERP".to_string(),
            description: "Terp Network".to_string(),
            image: "terp.svg".to_string(),
            decimals: 6,
            kind: TokenKind::Native,
            deposits: vec![ChannelBinding::new("Osmosis", "ibc/ABC").with_channel("channel-9")],
            withdrawals: vec![ChannelBinding::new("Osmosis", "uterp").with_gas(200_000)],
        }
    }

    #[test]
    fn test_binding_lookup_is_case_insensitive() {
        let token = sample();
        let binding = token.deposit_binding("osmosis").unwrap();
        assert_eq!(binding.from_denom, "ibc/ABC");
        assert_eq!(binding.channel_id.as_deref(), Some("channel-9"));
        assert!(token.deposit_binding("juno").is_none());
        assert_eq!(token.withdrawal_binding("OSMOSIS").unwrap().gas, Some(200_000));
    }

    #[test]
    fn test_kind() {
        let mut token = sample();
        assert!(!token.is_contract());
        token.kind = TokenKind::Contract(ContractInfo {
            address: "terp1contract".into(),
            code_hash: "abc".into(),
        });
        assert_eq!(token.contract().unwrap().address, "terp1contract");
    }
}
