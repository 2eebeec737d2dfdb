//! Wallet session endpoints
//!
//! Connecting is two calls: `POST /wallet/connect` opens a wallet page and
//! returns its URL, then the frontend polls `GET /wallet/connect/:id` until
//! the user answered in the browser.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use terpdash_core::{TransferError, WalletError};
use wallet_bridge::{connect_request, request_fee_grant, RequestStatus, WalletKey, WalletPrompt};

use crate::dto::{
    failure, transfer_failure, wallet_failure, ApiError, ConnectRequest, ConnectStatusResponse,
    Failure, FeeGrantResponse, ViewingKeyRequest, WalletStatusResponse,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/connect", post(connect))
        .route("/connect/:id", get(connect_status))
        .route("/status", get(status))
        .route("/disconnect", post(disconnect))
        .route("/fee-grant", post(fee_grant))
        .route("/viewing-key", post(viewing_key))
}

/// POST /wallet/connect - Open a connect page for the home chain (or `chain`)
pub async fn connect(
    State(state): State<AppState>,
    body: Option<Json<ConnectRequest>>,
) -> Result<Json<WalletPrompt>, Failure> {
    let requested = body.and_then(|Json(b)| b.chain);
    let chain = match &requested {
        Some(name) => state.registry().chain(name).ok_or_else(|| {
            transfer_failure(TransferError::UnknownChain { name: name.clone() })
        })?,
        None => state.home_chain(),
    };
    Ok(Json(state.signer().open(connect_request(chain)).await))
}

/// GET /wallet/connect/:id - Outcome of a connect page
///
/// A completed request stores the key in the session. Finished requests are
/// dropped, so polling again afterwards answers 404.
pub async fn connect_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConnectStatusResponse>, Failure> {
    let status = state
        .signer()
        .server()
        .get_request_status(&id)
        .await
        .ok_or_else(|| {
            failure(
                StatusCode::NOT_FOUND,
                ApiError::not_found(format!("Unknown wallet request: {}", id)),
            )
        })?;

    if !status.is_pending() {
        state.signer().dismiss(&id).await;
    }

    match &status {
        RequestStatus::Pending => {}
        RequestStatus::Completed(value) => {
            let key: WalletKey = serde_json::from_value(value.clone()).map_err(|e| {
                wallet_failure(WalletError::InvalidReply {
                    message: format!("connect reply: {}", e),
                })
            })?;
            tracing::info!(chain_id = %key.chain_id, address = %key.address, "Wallet connected");
            state.session().write().await.set_key(key);
        }
        RequestStatus::Rejected(reason) => {
            return Err(wallet_failure(WalletError::Rejected {
                reason: reason.clone(),
            }))
        }
        RequestStatus::ExtensionMissing => return Err(wallet_failure(WalletError::ExtensionMissing)),
        RequestStatus::Expired => {
            return Err(wallet_failure(WalletError::Expired {
                request_id: id.clone(),
            }))
        }
    }

    Ok(Json(ConnectStatusResponse {
        request_id: id,
        status,
        session: state.session().read().await.snapshot(),
    }))
}

/// GET /wallet/status - Session and the wallet page waiting for the user
pub async fn status(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    Json(WalletStatusResponse {
        session: state.session().read().await.snapshot(),
        prompt: state.signer().current_prompt(),
    })
}

/// POST /wallet/disconnect - Forget keys and the balance selection
pub async fn disconnect(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    state.session().write().await.disconnect();
    state.balances().clear().await;
    tracing::info!("Wallet disconnected");
    status(State(state)).await
}

/// POST /wallet/fee-grant - Ask the faucet for a fee allowance
pub async fn fee_grant(State(state): State<AppState>) -> Result<Json<FeeGrantResponse>, Failure> {
    let address = state
        .session()
        .read()
        .await
        .home_key()
        .map(|k| k.address.clone())
        .ok_or_else(|| {
            wallet_failure(WalletError::NotConnected {
                chain: state.home_chain().chain_name.clone(),
            })
        })?;

    let outcome = request_fee_grant(state.lcd().http(), &state.config().faucet.url, &address).await;
    state.session().write().await.set_fee_grant(outcome);
    Ok(Json(FeeGrantResponse { fee_grant: outcome }))
}

/// POST /wallet/viewing-key - Store the viewing key of a contract token
pub async fn viewing_key(
    State(state): State<AppState>,
    Json(request): Json<ViewingKeyRequest>,
) -> Result<Json<WalletStatusResponse>, Failure> {
    let token = state.registry().token(&request.token).ok_or_else(|| {
        transfer_failure(TransferError::UnknownToken {
            name: request.token.clone(),
        })
    })?;
    let contract = token.contract().ok_or_else(|| {
        failure(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request(format!("{} has no viewing key", token.name)),
        )
    })?;
    if request.key.trim().is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            ApiError::bad_request("Viewing key must not be empty"),
        ));
    }

    state
        .session()
        .write()
        .await
        .set_viewing_key(contract.address.clone(), request.key.trim());
    state.balances().refresh().await;
    Ok(status(State(state)).await)
}

#[cfg(test)]
mod tests {
    use crate::routes::testing::{call, state_for};
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use wallet_bridge::WalletKey;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn home_key() -> WalletKey {
        WalletKey {
            chain_id: "morocco-1".into(),
            address: "terp1tester".into(),
            pub_key: "Ag==".into(),
            name: "tester".into(),
            algo: "secp256k1".into(),
        }
    }

    #[tokio::test]
    async fn test_connect_flow() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;

        let (status, prompt) = call(&state, Method::POST, "/wallet/connect", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(prompt["chain_id"], "morocco-1");
        let id = prompt["request_id"].as_str().unwrap().to_string();
        let url = prompt["url"].as_str().unwrap().to_string();

        let (_, pending) = call(&state, Method::GET, &format!("/wallet/connect/{}", id), None).await;
        assert_eq!(pending["status"]["status"], "pending");
        assert_eq!(pending["session"]["connected"], false);

        let (_, wallet) = call(&state, Method::GET, "/wallet/status", None).await;
        assert_eq!(wallet["prompt"]["request_id"], id.as_str());

        let reply = reqwest::Client::new()
            .post(format!("{}/callback", url))
            .json(&json!({"ok": true, "result": home_key()}))
            .send()
            .await
            .unwrap();
        assert!(reply.status().is_success());

        let (status, done) = call(&state, Method::GET, &format!("/wallet/connect/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"]["status"], "completed");
        assert_eq!(done["session"]["connected"], true);
        assert_eq!(done["session"]["home_address"], "terp1tester");

        let (status, _) = call(&state, Method::GET, &format!("/wallet/connect/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, wallet) = call(&state, Method::GET, "/wallet/status", None).await;
        assert!(wallet["prompt"].is_null());
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;

        let (_, prompt) = call(&state, Method::POST, "/wallet/connect", Some(json!({"chain": "Osmosis"}))).await;
        assert_eq!(prompt["chain_id"], "osmosis-1");
        let id = prompt["request_id"].as_str().unwrap().to_string();

        reqwest::Client::new()
            .post(format!("{}/callback", prompt["url"].as_str().unwrap()))
            .json(&json!({"ok": false, "error": "Request rejected"}))
            .send()
            .await
            .unwrap();

        let (status, body) = call(&state, Method::GET, &format!("/wallet/connect/{}", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "wallet_rejected");
    }

    #[tokio::test]
    async fn test_fee_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/claim"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let state = state_for(&server).await;

        let (status, body) = call(&state, Method::POST, "/wallet/fee-grant", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "not_connected");

        state.session().write().await.set_key(home_key());
        let (status, body) = call(&state, Method::POST, "/wallet/fee-grant", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fee_grant"], "Success");

        let (_, body) = call(&state, Method::POST, "/wallet/disconnect", None).await;
        assert_eq!(body["session"]["connected"], false);
        assert_eq!(body["session"]["fee_grant"], "Untouched");
    }

    #[tokio::test]
    async fn test_viewing_key() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;

        let (status, _) = call(
            &state,
            Method::POST,
            "/wallet/viewing-key",
            Some(json!({"token": "TERP", "key": "api_key_abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(
            &state,
            Method::POST,
            "/wallet/viewing-key",
            Some(json!({"token": "sATOM", "key": "api_key_abc"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let contract = state.registry().token("sATOM").unwrap().contract().unwrap().address.clone();
        assert_eq!(body["session"]["viewing_keys"], json!([contract]));
        assert_eq!(
            state.session().read().await.viewing_key(&contract),
            Some("api_key_abc")
        );
    }
}
