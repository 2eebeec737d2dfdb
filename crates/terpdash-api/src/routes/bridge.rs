//! Bridge endpoints: balance selection, percentage buttons, transfers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ibc_transfer::{BalanceSelection, BalanceState, TransferRequest};
use ibc_tx::{amount_for_percentage, format_amount};
use terpdash_core::{TransferError, TransferMode};

use crate::dto::{
    failure, transfer_failure, ApiError, BalanceResponse, Failure, PercentageRequest,
    PercentageResponse, SelectRequest, TransferResponse, WrapPromptResponse,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/select", post(select))
        .route("/balance", get(get_balance))
        .route("/percentage", post(percentage))
        .route("/transfer", post(transfer))
        .route("/transfer/:id", get(get_transfer))
        .route("/wrap-prompt", get(wrap_prompt))
}

/// POST /bridge/select - Choose direction, chain and token; restarts balance
/// polling for the sending address
pub async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<BalanceResponse>, Failure> {
    let registry = state.registry();
    let token = registry.token(&request.token).ok_or_else(|| {
        transfer_failure(TransferError::UnknownToken {
            name: request.token.clone(),
        })
    })?;
    let chain = registry.chain(&request.chain).ok_or_else(|| {
        transfer_failure(TransferError::UnknownChain {
            name: request.chain.clone(),
        })
    })?;

    let (routed, sender) = match request.mode {
        TransferMode::Deposit => (token.deposit_binding(&chain.chain_name).is_some(), chain),
        TransferMode::Withdrawal => (
            token.withdrawal_binding(&chain.chain_name).is_some(),
            state.home_chain(),
        ),
    };
    if !routed {
        return Err(transfer_failure(TransferError::UnsupportedRoute {
            token: token.name.clone(),
            chain: chain.chain_name.clone(),
        }));
    }

    let address = state
        .session()
        .read()
        .await
        .address(&sender.chain_id)
        .map(str::to_string)
        .ok_or_else(|| {
            transfer_failure(TransferError::NotConnected {
                chain: sender.chain_name.clone(),
            })
        })?;

    state
        .balances()
        .select(BalanceSelection {
            mode: request.mode,
            chain: chain.chain_name.clone(),
            token: token.name.clone(),
            address,
        })
        .await;

    Ok(Json(balance_response(&state)))
}

/// GET /bridge/balance - Balance of the current selection
pub async fn get_balance(State(state): State<AppState>) -> Json<BalanceResponse> {
    Json(balance_response(&state))
}

fn balance_response(state: &AppState) -> BalanceResponse {
    let snapshot = state.balances().snapshot();
    let decimals = snapshot
        .selection
        .as_ref()
        .and_then(|s| state.registry().token(&s.token))
        .map(|t| t.decimals);

    let mut response = BalanceResponse {
        selection: snapshot.selection.clone(),
        state: "loading",
        amount: None,
        formatted: None,
        error: None,
    };
    match snapshot.state {
        BalanceState::Loading => {}
        BalanceState::Amount(raw) => {
            response.state = "amount";
            response.amount = Some(raw.to_string());
            response.formatted = decimals.map(|d| format_amount(raw, d));
        }
        BalanceState::NeedsViewingKey => response.state = "needs_viewing_key",
        BalanceState::Error(message) => {
            response.state = "error";
            response.error = Some(message);
        }
    }
    response
}

/// POST /bridge/percentage - Amount for a 25/50/75/100% button
pub async fn percentage(
    State(state): State<AppState>,
    Json(request): Json<PercentageRequest>,
) -> Result<Json<PercentageResponse>, Failure> {
    if request.percent == 0 || request.percent > 100 {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request("Percent must be between 1 and 100"),
        ));
    }

    let snapshot = state.balances().snapshot();
    let unavailable = || {
        failure(
            StatusCode::CONFLICT,
            ApiError::new("balance_unavailable", "No balance loaded for the current selection"),
        )
    };
    let (selection, raw) = match (&snapshot.selection, &snapshot.state) {
        (Some(selection), BalanceState::Amount(raw)) => (selection, *raw),
        _ => return Err(unavailable()),
    };
    let decimals = state
        .registry()
        .token(&selection.token)
        .map(|t| t.decimals)
        .ok_or_else(unavailable)?;

    let amount = amount_for_percentage(raw, decimals, request.percent).ok_or_else(|| {
        failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("insufficient_balance", "Balance too small for this share"),
        )
    })?;
    Ok(Json(PercentageResponse { amount }))
}

/// POST /bridge/transfer - Submit a transfer; progress via /bridge/transfer/:id
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, Failure> {
    let handle = state
        .transfers()
        .submit(request)
        .await
        .map_err(transfer_failure)?;
    Ok(Json(TransferResponse {
        notice: handle.notice(),
        id: handle.id,
    }))
}

/// GET /bridge/transfer/:id - Latest notice of a submission
pub async fn get_transfer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TransferResponse>, Failure> {
    let notice = state.transfers().notice(&id).await.ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            ApiError::not_found(format!("Unknown transfer: {}", id)),
        )
    })?;
    Ok(Json(TransferResponse { id, notice }))
}

/// GET /bridge/wrap-prompt - Pop the oldest pending wrap offer
pub async fn wrap_prompt(State(state): State<AppState>) -> Json<WrapPromptResponse> {
    Json(WrapPromptResponse {
        prompt: state.transfers().take_wrap_prompt().await,
    })
}
