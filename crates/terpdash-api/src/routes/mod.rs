//! API route handlers

pub mod apps;
pub mod bridge;
pub mod dashboard;
pub mod health;
pub mod node;
pub mod registry;
pub mod wallet;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/node", node::router())
        .nest("/registry", registry::router())
        .nest("/dashboard", dashboard::router())
        .nest("/apps", apps::router())
        .nest("/wallet", wallet::router())
        .nest("/bridge", bridge::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use terpdash_core::{AppConfig, FaucetConfig, MarketConfig};
    use tower::ServiceExt;
    use wiremock::MockServer;

    use crate::{create_app, AppState};

    /// State whose every upstream points at `server`
    pub async fn state_for(server: &MockServer) -> AppState {
        let uri = server.uri();
        let config = AppConfig {
            home_lcd_url: Some(uri.clone()),
            market: MarketConfig {
                chain_info_url: format!("{}/chain_info", uri),
                coingecko_url: uri.clone(),
                defillama_url: uri.clone(),
                apps_url: format!("{}/api/dapps", uri),
                ..Default::default()
            },
            faucet: FaucetConfig {
                url: format!("{}/claim", uri),
                ..Default::default()
            },
            ..Default::default()
        };
        AppState::new(config).await.unwrap()
    }

    pub async fn call(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
