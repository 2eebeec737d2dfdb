//! Wallet bridge request and reply types

use std::time::{Duration, Instant};

use ibc_tx::{decode_base64, StdSignDoc};
use serde::{Deserialize, Serialize};
use terpdash_core::TxError;
use tokio::sync::watch;

/// How long a request stays answerable
pub const REQUEST_TTL: Duration = Duration::from_secs(300);

/// What the page should ask the extension to do
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalletRequest {
    /// Suggest (if needed), enable and read the key for `chain_id`
    Connect {
        chain_id: String,
        bech32_prefix: String,
        /// Chain description to register before enabling
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggest: Option<serde_json::Value>,
    },
    SignAmino {
        chain_id: String,
        signer: String,
        sign_doc: StdSignDoc,
    },
    SignDirect {
        chain_id: String,
        signer: String,
        /// Base64 `TxBody` bytes
        body_bytes: String,
        /// Base64 `AuthInfo` bytes
        auth_info_bytes: String,
        account_number: String,
        is_ethereum: bool,
    },
}

impl WalletRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::SignAmino { .. } => "sign_amino",
            Self::SignDirect { .. } => "sign_direct",
        }
    }

    pub fn chain_id(&self) -> &str {
        match self {
            Self::Connect { chain_id, .. }
            | Self::SignAmino { chain_id, .. }
            | Self::SignDirect { chain_id, .. } => chain_id,
        }
    }
}

/// Status of a pending request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Waiting for the page to answer
    Pending,
    /// The extension answered; payload depends on the request kind
    Completed(serde_json::Value),
    /// The user or the extension refused
    Rejected(String),
    /// The page found no extension before its ready timeout
    ExtensionMissing,
    Expired,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Page -> server answer
#[derive(Debug, Clone, Deserialize)]
pub struct PageReply {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub extension_missing: bool,
}

impl PageReply {
    pub fn into_status(self) -> RequestStatus {
        if self.extension_missing {
            return RequestStatus::ExtensionMissing;
        }
        match (self.ok, self.result) {
            (true, Some(result)) => RequestStatus::Completed(result),
            (true, None) => RequestStatus::Rejected("empty reply from wallet page".to_string()),
            (false, _) => RequestStatus::Rejected(
                self.error
                    .unwrap_or_else(|| "request rejected".to_string()),
            ),
        }
    }
}

/// A request waiting for the browser page
#[derive(Debug)]
pub struct PendingRequest {
    pub id: String,
    pub request: WalletRequest,
    pub created_at: Instant,
    status: watch::Sender<RequestStatus>,
}

impl PendingRequest {
    pub fn new(id: String, request: WalletRequest) -> Self {
        let (status, _) = watch::channel(RequestStatus::Pending);
        Self {
            id,
            request,
            created_at: Instant::now(),
            status,
        }
    }

    pub fn status(&self) -> RequestStatus {
        self.status.borrow().clone()
    }

    pub fn set_status(&self, status: RequestStatus) {
        self.status.send_replace(status);
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestStatus> {
        self.status.subscribe()
    }

    /// Check if request has expired (5 minutes)
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > REQUEST_TTL
    }
}

/// Key material returned by the extension for one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletKey {
    pub chain_id: String,
    pub address: String,
    /// Base64 compressed public key
    pub pub_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub algo: String,
}

impl WalletKey {
    pub fn pub_key_bytes(&self) -> Result<Vec<u8>, TxError> {
        decode_base64("pub_key", &self.pub_key)
    }

    /// Ethermint keys report `ethsecp256k1`
    pub fn is_ethermint(&self) -> bool {
        self.algo == "ethsecp256k1"
    }
}

/// Signature object in the extension's reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: SignaturePubKey,
    /// Base64 signature bytes
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePubKey {
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 key bytes
    pub value: String,
}

impl StdSignature {
    pub fn signature_bytes(&self) -> Result<Vec<u8>, TxError> {
        decode_base64("signature", &self.signature)
    }

    pub fn pub_key_bytes(&self) -> Result<Vec<u8>, TxError> {
        decode_base64("pub_key", &self.pub_key.value)
    }
}

/// Reply to `SignAmino`: the document actually signed plus the signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AminoSignResponse {
    pub signed: StdSignDoc,
    pub signature: StdSignature,
}

/// Signed direct document as echoed back by the page (bytes in base64)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDirectDoc {
    pub body_bytes: String,
    pub auth_info_bytes: String,
    pub chain_id: String,
    pub account_number: String,
}

/// Reply to `SignDirect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectSignResponse {
    pub signed: SignedDirectDoc,
    pub signature: StdSignature,
}

impl DirectSignResponse {
    pub fn body_bytes(&self) -> Result<Vec<u8>, TxError> {
        decode_base64("body_bytes", &self.signed.body_bytes)
    }

    pub fn auth_info_bytes(&self) -> Result<Vec<u8>, TxError> {
        decode_base64("auth_info_bytes", &self.signed.auth_info_bytes)
    }
}
