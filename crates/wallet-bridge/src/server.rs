//! Axum HTTP server that hosts the wallet page

use axum::{routing::get, routing::post, Router};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use terpdash_core::WalletError;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{handle_callback, handle_page, handle_request_json};
use crate::types::{PendingRequest, RequestStatus, WalletRequest};

/// How often expired requests are evicted
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state
pub struct ServerState {
    pub port: u16,
    pub host: String,
    /// Pending requests by ID
    pub pending_requests: RwLock<HashMap<String, PendingRequest>>,
}

/// Local page server through which the browser extension is driven
pub struct WalletBridgeServer {
    state: Arc<ServerState>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    cleanup: tokio::task::JoinHandle<()>,
}

impl WalletBridgeServer {
    /// Start the server on a specific port (0 for auto-assign)
    ///
    /// Binds to loopback: the extension runs in a browser on this machine.
    pub async fn start_on_port(port: u16) -> Result<Self, std::io::Error> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        let state = Arc::new(ServerState {
            port: actual_port,
            host: "127.0.0.1".to_string(),
            pending_requests: RwLock::new(HashMap::new()),
        });

        let app = Router::new()
            .route("/wallet/:id", get(handle_page))
            .route("/wallet/:id/request", get(handle_request_json))
            .route("/wallet/:id/callback", post(handle_callback))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            tracing::info!("Wallet bridge starting on port {}", actual_port);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Wallet bridge shutting down");
                })
                .await
                .ok();
        });

        let cleanup_state = state.clone();
        let cleanup = tokio::spawn(async move {
            loop {
                tokio::time::sleep(CLEANUP_INTERVAL).await;
                evict_expired(&cleanup_state).await;
            }
        });

        Ok(Self {
            state,
            shutdown_tx: Some(shutdown_tx),
            cleanup,
        })
    }

    pub fn port(&self) -> u16 {
        self.state.port
    }

    pub fn host(&self) -> &str {
        &self.state.host
    }

    /// Register a request; returns its id and the page URL to open
    pub async fn create_request(&self, request: WalletRequest) -> (String, String) {
        let id = generate_request_id();
        tracing::debug!(request_id = %id, kind = request.kind(), chain_id = request.chain_id(), "Wallet request created");

        let mut requests = self.state.pending_requests.write().await;
        requests.insert(id.clone(), PendingRequest::new(id.clone(), request));

        let url = self.page_url(&id);
        (id, url)
    }

    /// Page URL for a request
    pub fn page_url(&self, request_id: &str) -> String {
        format!(
            "http://{}:{}/wallet/{}",
            self.state.host, self.state.port, request_id
        )
    }

    pub async fn get_request_status(&self, request_id: &str) -> Option<RequestStatus> {
        let requests = self.state.pending_requests.read().await;
        requests.get(request_id).map(|r| r.status())
    }

    /// Wait until the page answers `request_id`, or `timeout` elapses
    ///
    /// The request is removed once it resolves either way.
    pub async fn wait_for(
        &self,
        request_id: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, WalletError> {
        let mut rx = {
            let requests = self.state.pending_requests.read().await;
            requests
                .get(request_id)
                .map(|r| r.subscribe())
                .ok_or_else(|| WalletError::Expired {
                    request_id: request_id.to_string(),
                })?
        };

        let outcome = tokio::time::timeout(timeout, async {
            rx.wait_for(|s| !s.is_pending()).await.map(|s| s.clone())
        })
        .await;
        let status = match outcome {
            Err(_) => {
                self.cancel_request(request_id).await;
                return Err(WalletError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
            // Sender dropped: the cleanup loop evicted the request.
            Ok(Err(_)) => RequestStatus::Expired,
            Ok(Ok(status)) => status,
        };
        self.cancel_request(request_id).await;

        match status {
            RequestStatus::Completed(value) => Ok(value),
            RequestStatus::Rejected(reason) => Err(WalletError::Rejected { reason }),
            RequestStatus::ExtensionMissing => Err(WalletError::ExtensionMissing),
            RequestStatus::Expired | RequestStatus::Pending => Err(WalletError::Expired {
                request_id: request_id.to_string(),
            }),
        }
    }

    pub async fn cancel_request(&self, request_id: &str) {
        let mut requests = self.state.pending_requests.write().await;
        requests.remove(request_id);
    }

    /// Number of requests still held
    pub async fn pending_count(&self) -> usize {
        self.state.pending_requests.read().await.len()
    }
}

impl Drop for WalletBridgeServer {
    fn drop(&mut self) {
        self.cleanup.abort();
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Mark expired requests and drop them
async fn evict_expired(state: &ServerState) {
    let mut requests = state.pending_requests.write().await;
    requests.retain(|id, req| {
        let expired = req.is_expired();
        if expired {
            tracing::debug!("Cleaning up expired wallet request: {}", id);
            req.set_status(RequestStatus::Expired);
        }
        !expired
    });
}

/// Generate a random request ID
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let random: u32 = rand::random();
    format!("{:x}{:08x}", timestamp, random)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn connect_request() -> WalletRequest {
        WalletRequest::Connect {
            chain_id: "morocco-1".into(),
            bech32_prefix: "terp".into(),
            suggest: None,
        }
    }

    #[tokio::test]
    async fn test_callback_resolves_waiter() {
        let server = WalletBridgeServer::start_on_port(0).await.unwrap();
        let (id, url) = server.create_request(connect_request()).await;
        assert!(url.ends_with(&format!("/wallet/{}", id)));

        let callback = format!("{}/callback", url);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            reqwest::Client::new()
                .post(callback)
                .json(&json!({
                    "ok": true,
                    "result": {"chain_id": "morocco-1", "address": "terp1abc", "pub_key": "AQ=="}
                }))
                .send()
                .await
                .unwrap();
        });

        let value = server.wait_for(&id, Duration::from_secs(5)).await.unwrap();
        assert_eq!(value["address"], "terp1abc");
        assert_eq!(server.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let server = WalletBridgeServer::start_on_port(0).await.unwrap();
        let (id, _) = server.create_request(connect_request()).await;
        let err = server
            .wait_for(&id, Duration::from_millis(30))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Timeout { .. }));
        assert!(server.get_request_status(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_extension_missing_reported() {
        let server = WalletBridgeServer::start_on_port(0).await.unwrap();
        let (id, url) = server.create_request(connect_request()).await;
        reqwest::Client::new()
            .post(format!("{}/callback", url))
            .json(&json!({"ok": false, "extension_missing": true}))
            .send()
            .await
            .unwrap();
        let err = server.wait_for(&id, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, WalletError::ExtensionMissing));
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let server = WalletBridgeServer::start_on_port(0).await.unwrap();
        let err = server
            .wait_for("nope", Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Expired { .. }));
    }
}
