//! Dashboard metrics endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::dto::MetricsResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(get_metrics))
        .route("/refresh", post(refresh))
}

/// GET /dashboard/metrics - Last fetched metrics with derived figures
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics();
    Json(MetricsResponse {
        metrics: metrics.snapshot().await,
        derived: metrics.derived().await,
        failed_sources: None,
    })
}

/// POST /dashboard/refresh - Fetch every source again
///
/// Never fails as a whole; sources that did not answer keep their previous
/// value and are counted in `failed_sources`.
pub async fn refresh(State(state): State<AppState>) -> Json<MetricsResponse> {
    let metrics = state.metrics();
    let failed = metrics.refresh().await;
    Json(MetricsResponse {
        metrics: metrics.snapshot().await,
        derived: metrics.derived().await,
        failed_sources: Some(failed),
    })
}
