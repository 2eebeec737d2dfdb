//! lcd-client: thin Cosmos REST (LCD) client
//!
//! Every request is wrapped in a timeout so a slow endpoint degrades one
//! widget instead of hanging a poll loop. Responses are decoded into the
//! handful of typed shapes the dashboard and bridge need.

pub mod status;
pub mod types;

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::json;
use terpdash_core::{BlockHeight, LcdError, RawAmount};

pub use status::NodeStatus;
pub use types::{
    AccountInfo, Coin, DecCoin, Event, EventAttribute, StakingPool, TxResponse,
};

use types::{
    BalancesResponse, CommunityPoolResponse, GatewayError, LatestBlockResponse,
    SmartQueryResponse, StakingPoolResponse, SupplyResponse, TxEnvelope, TxSearchResponse,
};

/// Default timeout for LCD calls (30 seconds).
const LCD_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Result type for LCD client operations
pub type Result<T> = std::result::Result<T, LcdError>;

/// REST client bound to one chain's LCD endpoint
#[derive(Debug, Clone)]
pub struct LcdClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl LcdClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("terpdash")
            .build()
            .map_err(|e| LcdError::ApiError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self::with_http(http, base_url))
    }

    /// Share an existing HTTP connection pool
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: LCD_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        let request = self.http.get(&url).query(query);
        let response = timed_request(self.timeout, request.send(), &url).await?;
        decode(response, path).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let url = self.url(path);
        let request = self.http.post(&url).json(body);
        let response = timed_request(self.timeout, request.send(), &url).await?;
        decode(response, path).await
    }

    // =========================================================================
    // Bank
    // =========================================================================

    /// All bank balances of `address`
    pub async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        let path = format!("/cosmos/bank/v1beta1/balances/{}", address);
        let resp: BalancesResponse = self
            .get_json(&path, &[("pagination.limit", "1000".to_string())])
            .await?;
        Ok(resp.balances)
    }

    /// Balance of one denom; a denom the account does not hold is zero
    pub async fn balance_of(&self, address: &str, denom: &str) -> Result<RawAmount> {
        let balances = self.balances(address).await?;
        Ok(balances
            .iter()
            .find(|c| c.denom == denom)
            .map(Coin::raw_amount)
            .unwrap_or(0))
    }

    /// Total supply of `denom`
    pub async fn supply_of(&self, denom: &str) -> Result<RawAmount> {
        let resp: SupplyResponse = self
            .get_json(
                "/cosmos/bank/v1beta1/supply/by_denom",
                &[("denom", denom.to_string())],
            )
            .await?;
        Ok(resp.amount.raw_amount())
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Account number and sequence, unwrapping `EthAccount` and vesting accounts
    pub async fn account(&self, address: &str) -> Result<AccountInfo> {
        let path = format!("/cosmos/auth/v1beta1/accounts/{}", address);
        let resp: serde_json::Value = self.get_json(&path, &[]).await?;
        resp.get("account")
            .and_then(AccountInfo::from_account_json)
            .ok_or_else(|| LcdError::ParseError(format!("unexpected account shape for {}", address)))
    }

    // =========================================================================
    // CosmWasm
    // =========================================================================

    /// Run a smart query against `contract`, returning the `data` payload
    pub async fn smart_query(
        &self,
        contract: &str,
        query: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let encoded = BASE64.encode(query.to_string());
        let path = format!("/cosmwasm/wasm/v1/contract/{}/smart/{}", contract, encoded);
        let resp: SmartQueryResponse = self.get_json(&path, &[]).await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Broadcast signed `TxRaw` bytes in sync mode (returns after CheckTx)
    pub async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<TxResponse> {
        let body = json!({
            "tx_bytes": BASE64.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });
        let resp: TxEnvelope = self.post_json("/cosmos/tx/v1beta1/txs", &body).await?;
        tracing::debug!(
            txhash = %resp.tx_response.txhash,
            code = resp.tx_response.code,
            "Broadcast tx"
        );
        Ok(resp.tx_response)
    }

    /// Look up a transaction; `None` while it is not yet indexed
    pub async fn get_tx(&self, hash: &str) -> Result<Option<TxResponse>> {
        let path = format!("/cosmos/tx/v1beta1/txs/{}", hash);
        match self.get_json::<TxEnvelope>(&path, &[]).await {
            Ok(resp) => Ok(Some(resp.tx_response)),
            Err(LcdError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Search transactions matching every `events` condition (`type.key='value'`)
    pub async fn search_txs(&self, events: &[String]) -> Result<Vec<TxResponse>> {
        let mut query: Vec<(&str, String)> = events.iter().map(|e| ("events", e.clone())).collect();
        // Newer SDKs take a single `query` string instead of repeated `events`.
        query.push(("query", events.join(" AND ")));
        query.push(("order_by", "ORDER_BY_DESC".to_string()));
        let resp: TxSearchResponse = self.get_json("/cosmos/tx/v1beta1/txs", &query).await?;
        Ok(resp.tx_responses)
    }

    // =========================================================================
    // Chain state
    // =========================================================================

    pub async fn latest_block_height(&self) -> Result<BlockHeight> {
        let resp: LatestBlockResponse = self
            .get_json("/cosmos/base/tendermint/v1beta1/blocks/latest", &[])
            .await?;
        Ok(resp.block.header.height)
    }

    /// Chain id reported in the latest block header
    pub async fn chain_id(&self) -> Result<String> {
        let resp: LatestBlockResponse = self
            .get_json("/cosmos/base/tendermint/v1beta1/blocks/latest", &[])
            .await?;
        Ok(resp.block.header.chain_id)
    }

    pub async fn community_pool(&self) -> Result<Vec<DecCoin>> {
        let resp: CommunityPoolResponse = self
            .get_json("/cosmos/distribution/v1beta1/community_pool", &[])
            .await?;
        Ok(resp.pool)
    }

    pub async fn staking_pool(&self) -> Result<StakingPool> {
        let resp: StakingPoolResponse = self.get_json("/cosmos/staking/v1beta1/pool", &[]).await?;
        Ok(resp.pool)
    }

    /// Raw node info (`default_node_info`, `application_version`)
    pub async fn node_info(&self) -> Result<serde_json::Value> {
        self.get_json("/cosmos/base/tendermint/v1beta1/node_info", &[])
            .await
    }

    /// Whether the node is still catching up
    pub async fn syncing(&self) -> Result<bool> {
        let resp: serde_json::Value = self
            .get_json("/cosmos/base/tendermint/v1beta1/syncing", &[])
            .await?;
        Ok(resp["syncing"].as_bool().unwrap_or(false))
    }

    pub async fn is_online(&self) -> bool {
        self.latest_block_height().await.is_ok()
    }
}

/// Hands out `LcdClient`s for any chain over one shared connection pool
#[derive(Debug, Clone)]
pub struct LcdPool {
    http: reqwest::Client,
    timeout: Duration,
}

impl LcdPool {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("terpdash")
            .build()
            .map_err(|e| LcdError::ApiError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            http,
            timeout: LCD_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self, base_url: &str) -> LcdClient {
        LcdClient::with_http(self.http.clone(), base_url).with_timeout(self.timeout)
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Wrap an HTTP future with a timeout and map transport failures
async fn timed_request(
    timeout: Duration,
    fut: impl std::future::Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
    url: &str,
) -> Result<reqwest::Response> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| LcdError::Timeout {
            secs: timeout.as_secs(),
        })?
        .map_err(|e| {
            if e.is_timeout() {
                LcdError::Timeout {
                    secs: timeout.as_secs(),
                }
            } else if e.is_connect() {
                LcdError::Unreachable {
                    url: url.to_string(),
                }
            } else {
                LcdError::ApiError {
                    message: e.to_string(),
                }
            }
        })
}

/// Map status codes to errors and decode a successful body
async fn decode<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(|e| LcdError::ApiError {
        message: format!("Failed to read response body: {}", e),
    })?;

    if !status.is_success() {
        let message = serde_json::from_str::<GatewayError>(&body)
            .map(|g| g.message)
            .unwrap_or_else(|_| body.clone());
        // gRPC NotFound (5) surfaces as 404, or as 400/500 from older gateways.
        let grpc_not_found = serde_json::from_str::<GatewayError>(&body)
            .map(|g| g.code == 5)
            .unwrap_or(false);
        if status == reqwest::StatusCode::NOT_FOUND
            || grpc_not_found
            || message.contains("not found")
        {
            return Err(LcdError::NotFound {
                what: what.to_string(),
            });
        }
        return Err(LcdError::ApiError {
            message: format!("{} ({})", message, status.as_u16()),
        });
    }

    serde_json::from_str(&body).map_err(|e| LcdError::ParseError(format!("{}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> LcdClient {
        LcdClient::new(server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_balance_of_missing_denom_is_zero() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/bank/v1beta1/balances/osmo1abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "balances": [{"denom": "uosmo", "amount": "1500000"}],
                "pagination": {"next_key": null, "total": "1"}
            })))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        assert_eq!(lcd.balance_of("osmo1abc", "uosmo").await.unwrap(), 1_500_000);
        assert_eq!(lcd.balance_of("osmo1abc", "ibc/XYZ").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_tx_pending_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/tx/v1beta1/txs/DEADBEEF"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 5,
                "message": "tx not found: DEADBEEF",
                "details": []
            })))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        assert!(lcd.get_tx("DEADBEEF").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_broadcast_posts_sync_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cosmos/tx/v1beta1/txs"))
            .and(body_partial_json(json!({"mode": "BROADCAST_MODE_SYNC"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "tx_response": {
                    "height": "0",
                    "txhash": "ABC123",
                    "code": 11,
                    "raw_log": "out of gas"
                }
            })))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        let resp = lcd.broadcast_tx(&[1, 2, 3]).await.unwrap();
        assert_eq!(resp.txhash, "ABC123");
        assert!(!resp.is_success());
        assert_eq!(resp.raw_log, "out of gas");
    }

    #[tokio::test]
    async fn test_supply_and_staking_pool() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/bank/v1beta1/supply/by_denom"))
            .and(query_param("denom", "uterp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "amount": {"denom": "uterp", "amount": "1000000000000"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cosmos/staking/v1beta1/pool"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pool": {"bonded_tokens": "400000000000", "not_bonded_tokens": "1000"}
            })))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        assert_eq!(lcd.supply_of("uterp").await.unwrap(), 1_000_000_000_000);
        assert_eq!(lcd.staking_pool().await.unwrap().bonded(), 400_000_000_000);
    }

    #[tokio::test]
    async fn test_smart_query_returns_data() {
        let server = MockServer::start().await;
        let query = json!({"balance": {"address": "terp1abc", "key": "vk"}});
        let encoded = BASE64.encode(query.to_string());
        Mock::given(method("GET"))
            .and(path(format!(
                "/cosmwasm/wasm/v1/contract/terp1contract/smart/{}",
                encoded
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"balance": {"amount": "77"}}
            })))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        let data = lcd.smart_query("terp1contract", &query).await.unwrap();
        assert_eq!(data["balance"]["amount"], "77");
    }

    #[tokio::test]
    async fn test_server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/base/tendermint/v1beta1/blocks/latest"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let lcd = client(&server).await;
        let err = lcd.latest_block_height().await.unwrap_err();
        assert!(matches!(err, LcdError::ApiError { .. }));
        assert!(!lcd.is_online().await);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/staking/v1beta1/pool"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"pool": {"bonded_tokens": "1", "not_bonded_tokens": "0"}})),
            )
            .mount(&server)
            .await;

        let lcd = client(&server).await.with_timeout(Duration::from_millis(50));
        let err = lcd.staking_pool().await.unwrap_err();
        assert!(matches!(err, LcdError::Timeout { .. }));
    }
}
