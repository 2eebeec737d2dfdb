//! Wallet session: connected keys, fee grant and viewing keys
//!
//! Lives only in memory; nothing here is persisted.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::WalletKey;

/// Outcome of the fee-grant faucet request for this session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeeGrantStatus {
    #[default]
    Untouched,
    Success,
    Fail,
}

/// Keys and per-session flags for the connected wallet
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    home_chain_id: String,
    /// Keys by chain id
    keys: HashMap<String, WalletKey>,
    fee_grant: FeeGrantStatus,
    /// Viewing keys by token contract address
    viewing_keys: HashMap<String, String>,
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub connected: bool,
    pub home_address: Option<String>,
    pub addresses: HashMap<String, String>,
    pub fee_grant: FeeGrantStatus,
    pub viewing_keys: Vec<String>,
}

impl WalletSession {
    pub fn new(home_chain_id: impl Into<String>) -> Self {
        Self {
            home_chain_id: home_chain_id.into(),
            ..Default::default()
        }
    }

    /// Connected means the home chain key is present
    pub fn is_connected(&self) -> bool {
        self.keys.contains_key(&self.home_chain_id)
    }

    pub fn set_key(&mut self, key: WalletKey) {
        tracing::debug!(chain_id = %key.chain_id, address = %key.address, "Wallet key stored");
        self.keys.insert(key.chain_id.clone(), key);
    }

    pub fn key(&self, chain_id: &str) -> Option<&WalletKey> {
        self.keys.get(chain_id)
    }

    pub fn home_key(&self) -> Option<&WalletKey> {
        self.keys.get(&self.home_chain_id)
    }

    pub fn address(&self, chain_id: &str) -> Option<&str> {
        self.key(chain_id).map(|k| k.address.as_str())
    }

    /// Forget every key and viewing key; the fee-grant outcome is reset too
    pub fn disconnect(&mut self) {
        self.keys.clear();
        self.viewing_keys.clear();
        self.fee_grant = FeeGrantStatus::Untouched;
    }

    pub fn fee_grant(&self) -> FeeGrantStatus {
        self.fee_grant
    }

    pub fn set_fee_grant(&mut self, status: FeeGrantStatus) {
        self.fee_grant = status;
    }

    /// Granter to put on home-chain fees, once the faucet granted an allowance
    pub fn fee_granter(&self, faucet_address: &str) -> Option<String> {
        (self.fee_grant == FeeGrantStatus::Success).then(|| faucet_address.to_string())
    }

    pub fn set_viewing_key(&mut self, contract: impl Into<String>, key: impl Into<String>) {
        self.viewing_keys.insert(contract.into(), key.into());
    }

    pub fn viewing_key(&self, contract: &str) -> Option<&str> {
        self.viewing_keys.get(contract).map(String::as_str)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut viewing_keys: Vec<String> = self.viewing_keys.keys().cloned().collect();
        viewing_keys.sort();
        SessionSnapshot {
            connected: self.is_connected(),
            home_address: self.home_key().map(|k| k.address.clone()),
            addresses: self
                .keys
                .iter()
                .map(|(chain, key)| (chain.clone(), key.address.clone()))
                .collect(),
            fee_grant: self.fee_grant,
            viewing_keys,
        }
    }
}

/// Ask the faucet to grant a fee allowance to `address`
///
/// Any 2xx answer is `Success`; everything else, transport errors included,
/// is `Fail`.
pub async fn request_fee_grant(
    http: &reqwest::Client,
    faucet_url: &str,
    address: &str,
) -> FeeGrantStatus {
    let result = http
        .post(faucet_url)
        .timeout(Duration::from_secs(30))
        .json(&json!({ "address": address }))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!(address, "Fee grant approved");
            FeeGrantStatus::Success
        }
        Ok(resp) => {
            tracing::warn!(address, status = resp.status().as_u16(), "Fee grant refused");
            FeeGrantStatus::Fail
        }
        Err(e) => {
            tracing::warn!(address, error = %e, "Fee grant request failed");
            FeeGrantStatus::Fail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key(chain_id: &str, address: &str) -> WalletKey {
        WalletKey {
            chain_id: chain_id.into(),
            address: address.into(),
            pub_key: "AQ==".into(),
            name: "test".into(),
            algo: "secp256k1".into(),
        }
    }

    #[test]
    fn test_connected_requires_home_key() {
        let mut session = WalletSession::new("morocco-1");
        assert!(!session.is_connected());
        session.set_key(key("osmosis-1", "osmo1a"));
        assert!(!session.is_connected());
        session.set_key(key("morocco-1", "terp1a"));
        assert!(session.is_connected());
        assert_eq!(session.address("osmosis-1"), Some("osmo1a"));

        session.disconnect();
        assert!(!session.is_connected());
        assert!(session.key("osmosis-1").is_none());
    }

    #[test]
    fn test_fee_granter_only_after_success() {
        let mut session = WalletSession::new("morocco-1");
        assert_eq!(session.fee_granter("terp1faucet"), None);
        session.set_fee_grant(FeeGrantStatus::Fail);
        assert_eq!(session.fee_granter("terp1faucet"), None);
        session.set_fee_grant(FeeGrantStatus::Success);
        assert_eq!(session.fee_granter("terp1faucet").as_deref(), Some("terp1faucet"));
    }

    #[test]
    fn test_viewing_keys() {
        let mut session = WalletSession::new("morocco-1");
        session.set_viewing_key("terp1token", "api_key_abc");
        assert_eq!(session.viewing_key("terp1token"), Some("api_key_abc"));
        assert_eq!(session.snapshot().viewing_keys, vec!["terp1token".to_string()]);
    }

    #[tokio::test]
    async fn test_request_fee_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/claim"))
            .and(body_json(json!({"address": "terp1ok"})))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/claim"))
            .and(body_json(json!({"address": "terp1no"})))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let url = format!("{}/claim", server.uri());
        assert_eq!(
            request_fee_grant(&http, &url, "terp1ok").await,
            FeeGrantStatus::Success
        );
        assert_eq!(
            request_fee_grant(&http, &url, "terp1no").await,
            FeeGrantStatus::Fail
        );
    }
}
