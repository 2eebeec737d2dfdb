//! Error types for terpdash

use thiserror::Error;

/// Core errors that can occur in terpdash
#[derive(Debug, Error)]
pub enum Error {
    #[error("LCD error: {0}")]
    Lcd(#[from] LcdError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Chain REST (LCD) errors
#[derive(Debug, Error)]
pub enum LcdError {
    #[error("LCD unreachable at {url}")]
    Unreachable { url: String },

    #[error("LCD returned error: {message}")]
    ApiError { message: String },

    #[error("LCD request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Not found: {what}")]
    NotFound { what: String },
}

/// Transaction building errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Failed to build transaction: {message}")]
    BuildFailed { message: String },

    #[error("Failed to encode transaction: {message}")]
    EncodeFailed { message: String },

    #[error("Wallet returned an unusable signature: {message}")]
    BadSignature { message: String },
}

/// Wallet extension errors
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet extension not found in browser")]
    ExtensionMissing,

    #[error("Wallet request {request_id} expired")]
    Expired { request_id: String },

    #[error("Wallet rejected the request: {reason}")]
    Rejected { reason: String },

    #[error("No wallet connected for {chain}")]
    NotConnected { chain: String },

    #[error("Wallet bridge unavailable: {message}")]
    BridgeUnavailable { message: String },

    #[error("Wallet did not answer within {secs}s")]
    Timeout { secs: u64 },

    #[error("Wallet sent an unusable reply: {message}")]
    InvalidReply { message: String },
}

/// Market-data and dashboard errors
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("{source_name} request failed: {message}")]
    Fetch {
        source_name: &'static str,
        message: String,
    },

    #[error("{source_name} returned an unexpected payload: {message}")]
    Parse {
        source_name: &'static str,
        message: String,
    },

    #[error("LCD error: {0}")]
    Lcd(#[from] LcdError),
}

/// Transfer flow errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("No wallet connected for {chain}")]
    NotConnected { chain: String },

    #[error("A transfer is already in flight")]
    AlreadyInFlight,

    #[error("Unknown chain: {name}")]
    UnknownChain { name: String },

    #[error("Unknown token: {name}")]
    UnknownToken { name: String },

    #[error("Token {token} cannot be moved via {chain}")]
    UnsupportedRoute { token: String, chain: String },

    #[error("Broadcast failed with code {code}: {raw_log}")]
    BroadcastFailed { code: u32, raw_log: String },

    #[error("Transaction error: {0}")]
    Tx(#[from] TxError),

    #[error("LCD error: {0}")]
    Lcd(#[from] LcdError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

/// Result type alias for terpdash operations
pub type Result<T> = std::result::Result<T, Error>;

impl TransferError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::NotConnected { .. } => "not_connected",
            Self::AlreadyInFlight => "already_in_flight",
            Self::UnknownChain { .. } => "unknown_chain",
            Self::UnknownToken { .. } => "unknown_token",
            Self::UnsupportedRoute { .. } => "unsupported_route",
            Self::BroadcastFailed { .. } => "broadcast_failed",
            Self::Tx(_) => "tx_error",
            Self::Lcd(_) => "lcd_error",
            Self::Wallet(_) => "wallet_error",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } => 400,
            Self::UnknownChain { .. } | Self::UnknownToken { .. } => 404,
            Self::NotConnected { .. } | Self::UnsupportedRoute { .. } => 422,
            Self::AlreadyInFlight => 409,
            Self::BroadcastFailed { .. } | Self::Tx(_) => 422,
            Self::Lcd(_) | Self::Wallet(_) => 503,
        }
    }
}

impl LcdError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "lcd_unreachable",
            Self::ApiError { .. } => "lcd_api_error",
            Self::Timeout { .. } => "lcd_timeout",
            Self::ParseError(_) => "lcd_parse_error",
            Self::NotFound { .. } => "not_found",
        }
    }
}

impl WalletError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ExtensionMissing => "extension_missing",
            Self::Expired { .. } => "request_expired",
            Self::Rejected { .. } => "wallet_rejected",
            Self::NotConnected { .. } => "not_connected",
            Self::BridgeUnavailable { .. } => "bridge_unavailable",
            Self::Timeout { .. } => "wallet_timeout",
            Self::InvalidReply { .. } => "invalid_reply",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ExtensionMissing | Self::BridgeUnavailable { .. } => 503,
            Self::Expired { .. } => 410,
            Self::Rejected { .. } | Self::InvalidReply { .. } => 422,
            Self::NotConnected { .. } => 401,
            Self::Timeout { .. } => 504,
        }
    }
}

impl MetricsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "metrics_fetch_failed",
            Self::Parse { .. } => "metrics_parse_failed",
            Self::Lcd(e) => e.error_code(),
        }
    }
}
