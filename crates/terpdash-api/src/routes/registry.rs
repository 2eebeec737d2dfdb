//! Chain and token registry endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chain_registry::Chain;

use crate::dto::{failure, ApiError, Failure, TokensQuery, TokensResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chains", get(get_chains))
        .route("/tokens", get(get_tokens))
}

/// GET /registry/chains - Every chain, home chain included
pub async fn get_chains(State(state): State<AppState>) -> Json<Vec<Chain>> {
    Json(state.registry().chains().to_vec())
}

/// GET /registry/tokens?source= - Tokens, optionally only those depositable
/// from `source`
pub async fn get_tokens(
    State(state): State<AppState>,
    Query(query): Query<TokensQuery>,
) -> Result<Json<TokensResponse>, Failure> {
    let registry = state.registry();
    let tokens = match &query.source {
        Some(source) => {
            if registry.chain(source).is_none() {
                return Err(failure(
                    StatusCode::NOT_FOUND,
                    ApiError::not_found(format!("Unknown chain: {}", source)),
                ));
            }
            registry.supported_tokens(source).into_iter().cloned().collect()
        }
        None => registry.tokens().to_vec(),
    };
    Ok(Json(TokensResponse {
        source: query.source,
        tokens,
    }))
}
