//! Node status probing
//!
//! Reports whether the LCD answers, which chain it serves and whether it is
//! caught up.

use serde::{Deserialize, Serialize};

use crate::LcdClient;

/// Snapshot of an LCD endpoint's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub url: String,
    pub is_online: bool,
    pub chain_id: Option<String>,
    pub latest_height: u64,
    pub app_version: Option<String>,
    pub syncing: Option<bool>,
}

impl NodeStatus {
    fn offline(url: &str) -> Self {
        Self {
            url: url.to_string(),
            is_online: false,
            chain_id: None,
            latest_height: 0,
            app_version: None,
            syncing: None,
        }
    }
}

/// Probe an LCD endpoint; never fails, an unreachable node is reported offline
pub async fn probe_status(client: &LcdClient) -> NodeStatus {
    let latest_height = match client.latest_block_height().await {
        Ok(h) => h,
        Err(e) => {
            tracing::debug!(url = %client.base_url(), error = %e, "LCD offline");
            return NodeStatus::offline(client.base_url());
        }
    };

    let info = client.node_info().await.ok();
    let chain_id = info
        .as_ref()
        .and_then(|i| i["default_node_info"]["network"].as_str())
        .map(str::to_string);
    let app_version = info
        .as_ref()
        .and_then(|i| i["application_version"]["version"].as_str())
        .map(str::to_string);

    NodeStatus {
        url: client.base_url().to_string(),
        is_online: true,
        chain_id,
        latest_height,
        app_version,
        syncing: client.syncing().await.ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_probe_online() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cosmos/base/tendermint/v1beta1/blocks/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "block": {"header": {"height": "123456", "chain_id": "morocco-1"}}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cosmos/base/tendermint/v1beta1/node_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "default_node_info": {"network": "morocco-1"},
                "application_version": {"version": "v4.2.0"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cosmos/base/tendermint/v1beta1/syncing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"syncing": false})))
            .mount(&server)
            .await;

        let client = LcdClient::new(server.uri()).unwrap();
        let status = probe_status(&client).await;
        assert!(status.is_online);
        assert_eq!(status.latest_height, 123_456);
        assert_eq!(status.chain_id.as_deref(), Some("morocco-1"));
        assert_eq!(status.app_version.as_deref(), Some("v4.2.0"));
        assert_eq!(status.syncing, Some(false));
    }

    #[tokio::test]
    async fn test_probe_offline() {
        let server = MockServer::start().await;
        let client = LcdClient::new(server.uri()).unwrap();
        let status = probe_status(&client).await;
        assert!(!status.is_online);
        assert_eq!(status.latest_height, 0);
    }
}
