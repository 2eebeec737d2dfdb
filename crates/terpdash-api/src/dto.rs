//! Data Transfer Objects for API requests and responses

use axum::http::StatusCode;
use axum::Json;
use chain_registry::Token;
use dashboard::{AppEntry, DashboardMetrics, DerivedMetrics};
use ibc_transfer::{BalanceSelection, TransferNotice, WrapPrompt};
use serde::{Deserialize, Serialize};
use terpdash_core::{LcdError, TransferError, TransferMode, WalletError};
use wallet_bridge::{FeeGrantStatus, RequestStatus, SessionSnapshot, WalletPrompt};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Error half of every handler result
pub type Failure = (StatusCode, Json<ApiError>);

pub fn failure(status: StatusCode, error: ApiError) -> Failure {
    (status, Json(error))
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

pub fn transfer_failure(e: TransferError) -> Failure {
    failure(status_from(e.status_code()), ApiError::new(e.error_code(), e.to_string()))
}

pub fn wallet_failure(e: WalletError) -> Failure {
    failure(status_from(e.status_code()), ApiError::new(e.error_code(), e.to_string()))
}

pub fn lcd_failure(e: LcdError) -> Failure {
    failure(StatusCode::SERVICE_UNAVAILABLE, ApiError::new(e.error_code(), e.to_string()))
}

// ─── Registry ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TokensQuery {
    /// Only tokens depositable from this chain
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub source: Option<String>,
    pub tokens: Vec<Token>,
}

// ─── Dashboard ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    pub metrics: DashboardMetrics,
    pub derived: DerivedMetrics,
    /// Sources that failed during this refresh (refresh only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_sources: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppsQuery {
    #[serde(default)]
    pub search: String,
    /// Comma separated
    #[serde(default)]
    pub tags: String,
}

impl AppsQuery {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppsResponse {
    /// False until the directory has been fetched once
    pub loaded: bool,
    pub apps: Vec<AppEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsResponse {
    pub tags: Vec<String>,
}

// ─── Wallet ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectRequest {
    /// Chain to connect; the home chain when absent
    #[serde(default)]
    pub chain: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectStatusResponse {
    pub request_id: String,
    pub status: RequestStatus,
    pub session: SessionSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletStatusResponse {
    pub session: SessionSnapshot,
    /// Wallet page waiting for the user, if any
    pub prompt: Option<WalletPrompt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeeGrantResponse {
    pub fee_grant: FeeGrantStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewingKeyRequest {
    pub token: String,
    pub key: String,
}

// ─── Bridge ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SelectRequest {
    pub mode: TransferMode,
    pub chain: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub selection: Option<BalanceSelection>,
    /// `loading`, `amount`, `needs_viewing_key` or `error`
    pub state: &'static str,
    /// Base units
    pub amount: Option<String>,
    pub formatted: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PercentageRequest {
    pub percent: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct PercentageResponse {
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResponse {
    pub id: String,
    pub notice: TransferNotice,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrapPromptResponse {
    pub prompt: Option<WrapPrompt>,
}
