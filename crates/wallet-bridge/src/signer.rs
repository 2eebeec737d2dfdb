//! Wallet signer abstraction
//!
//! The transfer flow only talks to `WalletSigner`; `BridgeSigner` fulfils it
//! through the page server, tests substitute their own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chain_registry::Chain;
use ibc_tx::{DirectSignDoc, StdSignDoc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use terpdash_core::WalletError;
use tokio::sync::watch;

use crate::server::WalletBridgeServer;
use crate::types::{
    AminoSignResponse, DirectSignResponse, WalletKey, WalletRequest, REQUEST_TTL,
};

/// Operations the browser wallet extension offers
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Enable `chain` (suggesting it first if the wallet may not know it) and
    /// return the key
    async fn connect(&self, chain: &Chain) -> Result<WalletKey, WalletError>;

    async fn sign_amino(
        &self,
        chain_id: &str,
        signer: &str,
        doc: &StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError>;

    async fn sign_direct(
        &self,
        signer: &str,
        doc: &DirectSignDoc,
        is_ethereum: bool,
    ) -> Result<DirectSignResponse, WalletError>;
}

/// Page the user has to open to answer a wallet request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletPrompt {
    pub request_id: String,
    pub kind: &'static str,
    pub chain_id: String,
    pub url: String,
}

/// `WalletSigner` backed by the local page server
#[derive(Clone)]
pub struct BridgeSigner {
    server: Arc<WalletBridgeServer>,
    timeout: Duration,
    prompt: Arc<watch::Sender<Option<WalletPrompt>>>,
}

impl BridgeSigner {
    pub fn new(server: Arc<WalletBridgeServer>) -> Self {
        let (prompt, _) = watch::channel(None);
        Self {
            server,
            timeout: REQUEST_TTL,
            prompt: Arc::new(prompt),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The page currently waiting for the user, if any
    pub fn current_prompt(&self) -> Option<WalletPrompt> {
        self.prompt.borrow().clone()
    }

    pub fn subscribe_prompts(&self) -> watch::Receiver<Option<WalletPrompt>> {
        self.prompt.subscribe()
    }

    pub fn server(&self) -> &WalletBridgeServer {
        &self.server
    }

    /// Register a request without waiting (connect flow driven by the API)
    pub async fn open(&self, request: WalletRequest) -> WalletPrompt {
        let kind = request.kind();
        let chain_id = request.chain_id().to_string();
        let (request_id, url) = self.server.create_request(request).await;
        let prompt = WalletPrompt {
            request_id,
            kind,
            chain_id,
            url,
        };
        tracing::info!(url = %prompt.url, kind, chain_id = %prompt.chain_id, "Open this page to answer the wallet request");
        self.prompt.send_replace(Some(prompt.clone()));
        prompt
    }

    /// Wait for an opened request and decode the reply
    pub async fn resolve<T: DeserializeOwned>(&self, prompt: &WalletPrompt) -> Result<T, WalletError> {
        let outcome = self.server.wait_for(&prompt.request_id, self.timeout).await;
        self.clear_prompt(&prompt.request_id);
        let value = outcome?;
        serde_json::from_value(value).map_err(|e| WalletError::InvalidReply {
            message: format!("{} reply: {}", prompt.kind, e),
        })
    }

    /// Forget an opened request whose outcome was read through the server
    pub async fn dismiss(&self, request_id: &str) {
        self.server.cancel_request(request_id).await;
        self.clear_prompt(request_id);
    }

    fn clear_prompt(&self, request_id: &str) {
        self.prompt.send_if_modified(|current| {
            let same = current.as_ref().is_some_and(|p| p.request_id == request_id);
            if same {
                *current = None;
            }
            same
        });
    }

    async fn round_trip<T: DeserializeOwned>(&self, request: WalletRequest) -> Result<T, WalletError> {
        let prompt = self.open(request).await;
        self.resolve(&prompt).await
    }
}

/// Connect request for `chain`
pub fn connect_request(chain: &Chain) -> WalletRequest {
    WalletRequest::Connect {
        chain_id: chain.chain_id.clone(),
        bech32_prefix: chain.bech32_prefix.clone(),
        suggest: chain
            .needs_suggestion
            .then(|| chain.wallet_chain_info()),
    }
}

#[async_trait]
impl WalletSigner for BridgeSigner {
    async fn connect(&self, chain: &Chain) -> Result<WalletKey, WalletError> {
        self.round_trip(connect_request(chain)).await
    }

    async fn sign_amino(
        &self,
        chain_id: &str,
        signer: &str,
        doc: &StdSignDoc,
    ) -> Result<AminoSignResponse, WalletError> {
        self.round_trip(WalletRequest::SignAmino {
            chain_id: chain_id.to_string(),
            signer: signer.to_string(),
            sign_doc: doc.clone(),
        })
        .await
    }

    async fn sign_direct(
        &self,
        signer: &str,
        doc: &DirectSignDoc,
        is_ethereum: bool,
    ) -> Result<DirectSignResponse, WalletError> {
        self.round_trip(WalletRequest::SignDirect {
            chain_id: doc.chain_id.clone(),
            signer: signer.to_string(),
            body_bytes: BASE64.encode(&doc.body_bytes),
            auth_info_bytes: BASE64.encode(&doc.auth_info_bytes),
            account_number: doc.account_number.to_string(),
            is_ethereum,
        })
        .await
    }
}
