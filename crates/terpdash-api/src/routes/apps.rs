//! App directory endpoints

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::dto::{AppsQuery, AppsResponse, TagsResponse};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_apps))
        .route("/tags", get(get_tags))
}

/// GET /apps?search=&tags=a,b - Sorted app listing, filtered
pub async fn get_apps(
    State(state): State<AppState>,
    Query(query): Query<AppsQuery>,
) -> Json<AppsResponse> {
    Json(match state.apps().await {
        Some(directory) => AppsResponse {
            loaded: true,
            apps: directory.filter(&query.search, &query.tag_list()),
        },
        None => AppsResponse {
            loaded: false,
            apps: Vec::new(),
        },
    })
}

/// GET /apps/tags - Every tag in use
pub async fn get_tags(State(state): State<AppState>) -> Json<TagsResponse> {
    let tags = state.apps().await.map(|d| d.tags()).unwrap_or_default();
    Json(TagsResponse { tags })
}
