//! HTTP request handlers for the wallet page

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    Json,
};
use std::sync::Arc;

use crate::keplr_page::generate_page;
use crate::server::ServerState;
use crate::types::{PageReply, RequestStatus, WalletRequest};

/// Serve the wallet page
/// GET /wallet/{id}
pub async fn handle_page(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let requests = state.pending_requests.read().await;

    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;

    if request.is_expired() {
        return Err(StatusCode::GONE);
    }

    let title = match &request.request {
        WalletRequest::Connect { .. } => "Connect Wallet",
        WalletRequest::SignAmino { .. } | WalletRequest::SignDirect { .. } => "Sign Transaction",
    };

    Ok(Html(generate_page(&request_id, title, &state.host, state.port)))
}

/// Request payload the page executes
/// GET /wallet/{id}/request
pub async fn handle_request_json(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
) -> Result<Json<WalletRequest>, StatusCode> {
    let requests = state.pending_requests.read().await;

    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;

    if request.is_expired() {
        return Err(StatusCode::GONE);
    }
    if !request.status().is_pending() {
        return Err(StatusCode::CONFLICT);
    }

    Ok(Json(request.request.clone()))
}

/// Page reports the extension's answer
/// POST /wallet/{id}/callback
pub async fn handle_callback(
    State(state): State<Arc<ServerState>>,
    Path(request_id): Path<String>,
    Json(reply): Json<PageReply>,
) -> Result<StatusCode, StatusCode> {
    let requests = state.pending_requests.read().await;

    let request = requests.get(&request_id).ok_or(StatusCode::NOT_FOUND)?;

    if request.is_expired() {
        request.set_status(RequestStatus::Expired);
        return Err(StatusCode::GONE);
    }
    if !request.status().is_pending() {
        return Err(StatusCode::CONFLICT);
    }

    let status = reply.into_status();

    // The key must belong to the chain that was asked for.
    let wrong_prefix = match (&request.request, &status) {
        (WalletRequest::Connect { bech32_prefix, .. }, RequestStatus::Completed(value)) => {
            let address = value["address"].as_str().unwrap_or_default();
            (!terpdash_core::Address::new(address).has_prefix(bech32_prefix))
                .then(|| format!("address '{}' does not start with '{}'", address, bech32_prefix))
        }
        _ => None,
    };
    if let Some(reason) = wrong_prefix {
        tracing::warn!(request_id = %request_id, %reason, "Wallet returned address for wrong chain");
        request.set_status(RequestStatus::Rejected(reason));
        return Err(StatusCode::BAD_REQUEST);
    }

    match &status {
        RequestStatus::Completed(_) => {
            tracing::info!(request_id = %request_id, kind = request.request.kind(), "Wallet request completed")
        }
        RequestStatus::ExtensionMissing => {
            tracing::warn!(request_id = %request_id, "Wallet extension not found by page")
        }
        other => tracing::info!(request_id = %request_id, status = ?other, "Wallet request not completed"),
    }
    request.set_status(status);

    Ok(StatusCode::OK)
}
